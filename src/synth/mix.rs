//! Ambient mix: the three layers blended at fixed weights
//!
//! Each layer is a pure function of (sample count, sample rate, seed), so the
//! layers are rendered on scoped threads. The per-layer seeds are drawn from
//! the caller's generator up front, which keeps the result identical to a
//! sequential render.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{bells, drone, nature};
use crate::engine::AudioBuffer;

const NATURE_WEIGHT: f32 = 0.4;
const DRONE_WEIGHT: f32 = 0.3;
const BELLS_WEIGHT: f32 = 0.3;

type LayerFn = fn(usize, u32, &mut StdRng) -> AudioBuffer;

/// Synthesize the ambient mix
pub fn ambient_mix<R: Rng + ?Sized>(
    sample_count: usize,
    sample_rate: u32,
    rng: &mut R,
) -> AudioBuffer {
    let layers: [(LayerFn, f32, u64); 3] = [
        (nature::<StdRng>, NATURE_WEIGHT, rng.gen()),
        (drone::<StdRng>, DRONE_WEIGHT, rng.gen()),
        (bells::<StdRng>, BELLS_WEIGHT, rng.gen()),
    ];

    let rendered: Vec<(AudioBuffer, f32)> = std::thread::scope(|scope| {
        let handles: Vec<_> = layers
            .iter()
            .map(|&(layer, weight, seed)| {
                scope.spawn(move || {
                    let mut layer_rng = StdRng::seed_from_u64(seed);
                    (layer(sample_count, sample_rate, &mut layer_rng), weight)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut out = vec![0.0_f32; sample_count];
    for (buffer, weight) in &rendered {
        for (acc, &s) in out.iter_mut().zip(buffer.channel(0)) {
            *acc += weight * s;
        }
    }

    AudioBuffer::from_mono(out, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mix_matches_weighted_layers() {
        let sample_count = 44100 * 3;
        let mut rng = StdRng::seed_from_u64(77);
        let mixed = ambient_mix(sample_count, 44100, &mut rng);

        // Re-derive the layer seeds the same way and render sequentially
        let mut rng = StdRng::seed_from_u64(77);
        let seeds: [u64; 3] = [rng.gen(), rng.gen(), rng.gen()];
        let n = nature(sample_count, 44100, &mut StdRng::seed_from_u64(seeds[0]));
        let d = drone(sample_count, 44100, &mut StdRng::seed_from_u64(seeds[1]));
        let b = bells(sample_count, 44100, &mut StdRng::seed_from_u64(seeds[2]));

        for i in (0..sample_count).step_by(997) {
            let expected = 0.4 * n.channel(0)[i] + 0.3 * d.channel(0)[i] + 0.3 * b.channel(0)[i];
            assert_relative_eq!(mixed.channel(0)[i], expected, epsilon = 1e-6);
        }
    }
}
