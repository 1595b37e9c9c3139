//! Drone layer: stacked low harmonics with a shared slow vibrato

use std::f64::consts::TAU;

use rand::Rng;

use crate::dsp::{fade, lowpass, sine, white_noise, DEFAULT_FADE_SECS};
use crate::engine::AudioBuffer;

const FUNDAMENTALS_HZ: [f64; 3] = [55.0, 82.5, 110.0];
const HARMONICS: usize = 3;
const BASE_AMPLITUDE: f64 = 0.3;
const FUNDAMENTAL_ROLLOFF: f64 = 0.8;

const VIBRATO_HZ: f64 = 0.1;
const VIBRATO_DEPTH: f64 = 0.001;

const TEXTURE_AMPLITUDE: f64 = 0.02;
const TEXTURE_CUTOFF_HZ: f64 = 1000.0;

/// One sinusoidal component of the drone
#[derive(Debug, Clone, Copy)]
struct Partial {
    freq_hz: f64,
    amplitude: f64,
    phase: f64,
}

/// Synthesize the drone soundscape
pub fn drone<R: Rng + ?Sized>(sample_count: usize, sample_rate: u32, rng: &mut R) -> AudioBuffer {
    let mut partials = Vec::with_capacity(FUNDAMENTALS_HZ.len() * HARMONICS);
    for (i, &fundamental) in FUNDAMENTALS_HZ.iter().enumerate() {
        for harmonic in 1..=HARMONICS {
            partials.push(Partial {
                freq_hz: fundamental * harmonic as f64,
                amplitude: BASE_AMPLITUDE / harmonic as f64 * FUNDAMENTAL_ROLLOFF.powi(i as i32),
                phase: rng.gen::<f64>() * TAU,
            });
        }
    }

    let texture = lowpass(
        &white_noise(sample_count, TEXTURE_AMPLITUDE, rng),
        TEXTURE_CUTOFF_HZ,
        sample_rate,
    );

    let rate = sample_rate as f64;
    let mut out: Vec<f32> = (0..sample_count)
        .map(|i| {
            let t = i as f64 / rate;
            let vibrato = 1.0 + VIBRATO_DEPTH * sine(VIBRATO_HZ, t, 0.0);
            let tone: f64 = partials
                .iter()
                .map(|p| p.amplitude * sine(p.freq_hz * vibrato, t, p.phase))
                .sum();
            (tone + texture[i] as f64) as f32
        })
        .collect();

    fade(&mut out, sample_rate, DEFAULT_FADE_SECS);
    AudioBuffer::from_mono(out, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculate_rms;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_drone_has_body() {
        let mut rng = StdRng::seed_from_u64(5);
        let buffer = drone(44100 * 5, 44100, &mut rng);
        assert_eq!(buffer.len(), 44100 * 5);
        // Nine partials totalling well over 1.0 in peak amplitude
        assert!(calculate_rms(&buffer) > 0.1);
    }

    #[test]
    fn test_drone_phase_depends_on_seed() {
        let a = drone(4410, 44100, &mut StdRng::seed_from_u64(1));
        let b = drone(4410, 44100, &mut StdRng::seed_from_u64(2));
        assert_ne!(a, b);
    }
}
