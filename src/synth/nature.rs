//! Nature layer: wind, water and faint chirps

use std::f64::consts::TAU;

use rand::Rng;

use crate::dsp::{fade, lowpass, sine, white_noise, DEFAULT_FADE_SECS};
use crate::engine::AudioBuffer;

const WIND_AMPLITUDE: f64 = 0.1;
const WIND_CUTOFF_HZ: f64 = 800.0;
const WATER_AMPLITUDE: f64 = 0.05;
const WATER_CUTOFF_HZ: f64 = 400.0;

const BIRD_TONES_HZ: [f64; 3] = [220.0, 330.0, 440.0];
const BIRD_ENVELOPE_HZ: f64 = 0.1;
const BIRD_AMPLITUDE: f64 = 0.02;

const WIND_WEIGHT: f64 = 0.6;
const WATER_WEIGHT: f64 = 0.3;
const BIRD_WEIGHT: f64 = 0.1;

/// Synthesize the nature soundscape
pub fn nature<R: Rng + ?Sized>(sample_count: usize, sample_rate: u32, rng: &mut R) -> AudioBuffer {
    let wind = lowpass(
        &white_noise(sample_count, WIND_AMPLITUDE, rng),
        WIND_CUTOFF_HZ,
        sample_rate,
    );
    let water = lowpass(
        &white_noise(sample_count, WATER_AMPLITUDE, rng),
        WATER_CUTOFF_HZ,
        sample_rate,
    );

    let phases: Vec<f64> = BIRD_TONES_HZ.iter().map(|_| rng.gen::<f64>() * TAU).collect();

    let rate = sample_rate as f64;
    let mut out: Vec<f32> = (0..sample_count)
        .map(|i| {
            let t = i as f64 / rate;
            let birds: f64 = BIRD_TONES_HZ
                .iter()
                .zip(&phases)
                .map(|(&freq, &phase)| {
                    // Half-rectified slow swell gates each tone on and off
                    let envelope = (BIRD_AMPLITUDE * sine(BIRD_ENVELOPE_HZ, t, phase)).max(0.0);
                    sine(freq, t, phase) * envelope
                })
                .sum();

            (WIND_WEIGHT * wind[i] as f64 + WATER_WEIGHT * water[i] as f64 + BIRD_WEIGHT * birds)
                as f32
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
    fn test_nature_length_and_energy() {
        let mut rng = StdRng::seed_from_u64(11);
        let buffer = nature(44100 * 5, 44100, &mut rng);
        assert_eq!(buffer.len(), 44100 * 5);
        assert!(calculate_rms(&buffer) > 0.0);
        assert_eq!(buffer.channel(0)[0], 0.0);
    }

    #[test]
    fn test_nature_is_quiet_bed() {
        let mut rng = StdRng::seed_from_u64(12);
        let buffer = nature(44100 * 6, 44100, &mut rng);
        // Low-passed noise at these levels sits far below full scale
        assert!(calculate_rms(&buffer) < 0.1);
        assert!(buffer.is_within_unit_range());
    }
}
