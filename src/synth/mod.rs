//! Layer Synthesizers
//!
//! Procedural soundscapes built from the signal primitives. Every layer takes
//! `(sample_count, sample_rate, rng)`, returns a mono buffer of exactly
//! `sample_count` samples, and ends with a fade.
//!
//! Output is intentionally non-deterministic across seeds (random phases,
//! random strike placement) and fully deterministic for a fixed seed.

mod bells;
mod drone;
mod mix;
mod nature;
mod request;

pub use bells::{
    bells, render_strikes, schedule_strikes, EventSpec, PENTATONIC_HZ, SECONDS_PER_STRIKE,
    STRIKE_WINDOW_SECS,
};
pub use drone::drone;
pub use mix::ambient_mix;
pub use nature::nature;
pub use request::{validate_duration, SoundscapeKind, SynthesisRequest, MAX_DURATION_SECS};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::engine::AudioBuffer;

/// Render a request with a seeded generator
///
/// The result is clamped to [-1, 1] so it can be exported without further
/// processing.
pub fn synthesize(request: &SynthesisRequest, seed: u64) -> AudioBuffer {
    let sample_count = request.sample_count();
    let sample_rate = request.sample_rate();
    let mut rng = StdRng::seed_from_u64(seed);

    debug!(
        kind = %request.kind(),
        duration_secs = request.duration_secs(),
        sample_rate,
        seed,
        "synthesizing soundscape"
    );

    let mut buffer = match request.kind() {
        SoundscapeKind::Nature => nature(sample_count, sample_rate, &mut rng),
        SoundscapeKind::Drone => drone(sample_count, sample_rate, &mut rng),
        SoundscapeKind::Bells => bells(sample_count, sample_rate, &mut rng),
        SoundscapeKind::AmbientMix => ambient_mix(sample_count, sample_rate, &mut rng),
    };
    buffer.clamp();
    buffer
}
