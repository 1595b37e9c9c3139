//! Signal primitives shared by every soundscape layer
//!
//! All functions are stateless. Randomness is always supplied by the caller
//! so a fixed seed reproduces a layer exactly.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::filter::{filtfilt, BiquadCoeffs};

/// Default fade-in/fade-out length applied by the layer synthesizers
pub const DEFAULT_FADE_SECS: f64 = 2.0;

/// Gaussian white noise with standard deviation `amplitude`
pub fn white_noise<R: Rng + ?Sized>(sample_count: usize, amplitude: f64, rng: &mut R) -> Vec<f32> {
    // Normal::new only fails for a negative or non-finite std-dev
    let std_dev = if amplitude.is_finite() { amplitude.abs() } else { 0.0 };
    match Normal::new(0.0, std_dev) {
        Ok(dist) => (0..sample_count).map(|_| dist.sample(rng) as f32).collect(),
        Err(_) => vec![0.0; sample_count],
    }
}

/// Zero-phase second-order Butterworth low-pass
pub fn lowpass(samples: &[f32], cutoff_hz: f64, sample_rate: u32) -> Vec<f32> {
    let coeffs = BiquadCoeffs::butterworth_lowpass(cutoff_hz, sample_rate as f64);
    filtfilt(samples, &coeffs)
}

/// Linear fade in over the first `fade_secs` and fade out over the last
///
/// When the buffer is shorter than two fade lengths the ramps shrink to half
/// the buffer each, so the whole buffer is scaled by a triangle.
pub fn fade(samples: &mut [f32], sample_rate: u32, fade_secs: f64) {
    let len = samples.len();
    if len == 0 {
        return;
    }

    let requested = (fade_secs.max(0.0) * sample_rate as f64) as usize;
    let fade_len = if len >= 2 * requested { requested } else { len / 2 };
    if fade_len < 2 {
        if fade_len == 1 {
            samples[0] = 0.0;
            samples[len - 1] = 0.0;
        }
        return;
    }

    // Endpoint-inclusive ramp: first gain is exactly 0, last exactly 1
    let step = 1.0 / (fade_len - 1) as f32;
    for i in 0..fade_len {
        let gain = i as f32 * step;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

/// Clamp to [-1, 1] and map onto the signed 16-bit range
///
/// NaN becomes 0. Rounds to nearest.
pub fn normalize_and_quantize(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let clamped = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
            (clamped * 32767.0).round() as i16
        })
        .collect()
}

/// Sine oscillator sample at time `t`
#[inline]
pub(crate) fn sine(freq_hz: f64, t: f64, phase: f64) -> f64 {
    (2.0 * std::f64::consts::PI * freq_hz * t + phase).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rms(samples: &[f32]) -> f64 {
        let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_white_noise_amplitude_is_std_dev() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = white_noise(100_000, 0.1, &mut rng);
        assert_eq!(noise.len(), 100_000);
        assert_relative_eq!(rms(&noise), 0.1, epsilon = 0.005);
    }

    #[test]
    fn test_white_noise_is_seeded() {
        let a = white_noise(64, 0.5, &mut StdRng::seed_from_u64(1));
        let b = white_noise(64, 0.5, &mut StdRng::seed_from_u64(1));
        let c = white_noise(64, 0.5, &mut StdRng::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_lowpass_attenuates_above_cutoff() {
        let sample_rate = 44100;
        let high: Vec<f32> = (0..sample_rate)
            .map(|i| sine(8000.0, i as f64 / sample_rate as f64, 0.0) as f32)
            .collect();
        let low: Vec<f32> = (0..sample_rate)
            .map(|i| sine(100.0, i as f64 / sample_rate as f64, 0.0) as f32)
            .collect();

        let high_out = lowpass(&high, 800.0, sample_rate as u32);
        let low_out = lowpass(&low, 800.0, sample_rate as u32);

        assert!(rms(&high_out) < 0.02 * rms(&high));
        assert!(rms(&low_out) > 0.95 * rms(&low));
    }

    #[test]
    fn test_lowpass_noise_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = white_noise(44100, 0.1, &mut rng);
        let filtered = lowpass(&noise, 400.0, 44100);
        assert!(filtered.iter().all(|s| s.is_finite()));
        assert!(rms(&filtered) < rms(&noise));
    }

    #[test]
    fn test_fade_endpoints() {
        let sample_rate = 1000;
        let mut samples = vec![0.8_f32; 10_000];
        fade(&mut samples, sample_rate, 2.0);

        assert_eq!(samples[0], 0.0);
        assert_eq!(*samples.last().unwrap(), 0.0);
        // At fade_secs the gain has reached the unfaded amplitude
        assert_relative_eq!(samples[2000], 0.8);
        assert_relative_eq!(samples[1999], 0.8);
        assert_relative_eq!(samples[5000], 0.8);
        assert!(samples[1000] > 0.35 && samples[1000] < 0.45);
    }

    #[test]
    fn test_fade_short_buffer_scales_whole_buffer() {
        let mut samples = vec![1.0_f32; 11];
        fade(&mut samples, 1000, 2.0);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[10], 0.0);
        assert!(samples.iter().all(|&s| s <= 1.0));
        assert_eq!(samples[5], 1.0);
        assert!(samples[2] < samples[4]);
    }

    #[test]
    fn test_fade_empty_is_noop() {
        let mut samples: Vec<f32> = Vec::new();
        fade(&mut samples, 44100, 2.0);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_normalize_and_quantize() {
        let out = normalize_and_quantize(&[0.0, 1.0, -1.0, 0.5, 1.7, -9.0, f32::NAN]);
        assert_eq!(out, vec![0, 32767, -32767, 16384, 32767, -32767, 0]);
    }
}
