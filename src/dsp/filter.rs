//! Zero-phase Butterworth low-pass
//!
//! A second-order biquad (Audio EQ Cookbook low-pass, Q = 1/sqrt(2)) run
//! forward and then backward over the signal, which cancels the phase shift
//! and squares the magnitude response. This is the only low-pass in the crate.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Butterworth low-pass coefficients
    ///
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    pub fn butterworth_lowpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        // Keep the corner strictly inside (0, Nyquist)
        let nyquist = sample_rate / 2.0;
        let freq = cutoff_hz.clamp(1.0, nyquist * 0.99);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        BiquadCoeffs {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Magnitude response at `freq_hz` for a single pass
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

/// Biquad filter state (Direct Form I)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Filter `samples` forward then backward with the same biquad
pub fn filtfilt(samples: &[f32], coeffs: &BiquadCoeffs) -> Vec<f32> {
    let mut work: Vec<f64> = samples.iter().map(|&s| s as f64).collect();

    let mut forward = BiquadState::default();
    for sample in work.iter_mut() {
        *sample = forward.process(*sample, coeffs);
    }

    let mut backward = BiquadState::default();
    for sample in work.iter_mut().rev() {
        *sample = backward.process(*sample, coeffs);
    }

    work.into_iter().map(|s| s as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unity_gain_at_dc() {
        let coeffs = BiquadCoeffs::butterworth_lowpass(800.0, 44100.0);
        assert_relative_eq!(coeffs.magnitude_at(0.0, 44100.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minus_three_db_at_corner() {
        let coeffs = BiquadCoeffs::butterworth_lowpass(1000.0, 44100.0);
        assert_relative_eq!(
            coeffs.magnitude_at(1000.0, 44100.0),
            FRAC_1_SQRT_2,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_cutoff_above_nyquist_is_clamped() {
        let coeffs = BiquadCoeffs::butterworth_lowpass(50_000.0, 44100.0);
        assert!(coeffs.b0.is_finite() && coeffs.a1.is_finite() && coeffs.a2.is_finite());
        assert!(coeffs.magnitude_at(100.0, 44100.0) <= 1.0 + 1e-6);
    }

    #[test]
    fn test_filtfilt_keeps_length_and_dc() {
        let coeffs = BiquadCoeffs::butterworth_lowpass(400.0, 44100.0);
        let input = vec![0.5_f32; 44100];
        let output = filtfilt(&input, &coeffs);
        assert_eq!(output.len(), input.len());
        // Settled middle of a DC signal passes unchanged
        assert_relative_eq!(output[22050], 0.5, epsilon = 1e-4);
    }
}
