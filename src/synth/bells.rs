//! Bells layer: randomly placed strikes over a static pad
//!
//! Strike placement is stochastic on purpose. The same seed reproduces the
//! same schedule; a different seed gives a different but statistically
//! similar track (about one strike per eight seconds).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::{fade, sine, DEFAULT_FADE_SECS};
use crate::engine::AudioBuffer;

/// Pentatonic pitch set the strikes draw from
pub const PENTATONIC_HZ: [f64; 5] = [220.0, 247.0, 294.0, 330.0, 392.0];

/// Average spacing between strikes
pub const SECONDS_PER_STRIKE: f64 = 8.0;

/// Length of each strike's decay window
pub const STRIKE_WINDOW_SECS: f64 = 4.0;

const DECAY_RATE: f64 = 0.5;
const PARTIAL_WEIGHTS: [f64; 3] = [0.6, 0.3, 0.1];
const STRIKE_GAIN: f64 = 0.2;

const PAD_TONES_HZ: [f64; 3] = [110.0, 165.0, 220.0];
const PAD_AMPLITUDE: f64 = 0.05;

/// One scheduled bell strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Strike time from the start of the track, in seconds
    pub onset_secs: f64,
    /// Pitch of the first partial
    pub fundamental_hz: f64,
    /// Exponential decay constant of the envelope `exp(-rate * t)`
    pub decay_rate: f64,
    /// Weights of the 1st, 2nd and 3rd partial
    pub partial_amplitudes: Vec<f64>,
}

impl EventSpec {
    /// Sample value `t` seconds after the strike
    fn value_at(&self, t: f64) -> f64 {
        let envelope = (-self.decay_rate * t).exp();
        let tone: f64 = self
            .partial_amplitudes
            .iter()
            .enumerate()
            .map(|(k, &weight)| weight * sine(self.fundamental_hz * (k + 1) as f64, t, 0.0))
            .sum();
        tone * envelope * STRIKE_GAIN
    }
}

/// Draw the strike schedule for a track of `duration_secs`
pub fn schedule_strikes<R: Rng + ?Sized>(duration_secs: f64, rng: &mut R) -> Vec<EventSpec> {
    let count = (duration_secs / SECONDS_PER_STRIKE).floor().max(0.0) as usize;
    (0..count)
        .map(|_| EventSpec {
            onset_secs: rng.gen::<f64>() * duration_secs,
            fundamental_hz: PENTATONIC_HZ[rng.gen_range(0..PENTATONIC_HZ.len())],
            decay_rate: DECAY_RATE,
            partial_amplitudes: PARTIAL_WEIGHTS.to_vec(),
        })
        .collect()
}

/// Render a schedule into `out`, additively
///
/// Strikes whose window would run past the end of the buffer are skipped,
/// not truncated. Returns how many strikes were rendered.
pub fn render_strikes(out: &mut [f32], sample_rate: u32, strikes: &[EventSpec]) -> usize {
    let rate = sample_rate as f64;
    let window = (STRIKE_WINDOW_SECS * rate) as usize;
    let mut rendered = 0;

    for strike in strikes {
        let start = (strike.onset_secs * rate) as usize;
        if start + window >= out.len() {
            continue;
        }
        for (k, sample) in out[start..start + window].iter_mut().enumerate() {
            *sample += strike.value_at(k as f64 / rate) as f32;
        }
        rendered += 1;
    }

    rendered
}

/// Synthesize the bells soundscape
pub fn bells<R: Rng + ?Sized>(sample_count: usize, sample_rate: u32, rng: &mut R) -> AudioBuffer {
    let rate = sample_rate as f64;
    let strikes = schedule_strikes(sample_count as f64 / rate, rng);

    let mut out = vec![0.0_f32; sample_count];
    let rendered = render_strikes(&mut out, sample_rate, &strikes);
    tracing::debug!(scheduled = strikes.len(), rendered, "bell strikes placed");

    for (i, sample) in out.iter_mut().enumerate() {
        let t = i as f64 / rate;
        let pad: f64 = PAD_TONES_HZ
            .iter()
            .map(|&freq| PAD_AMPLITUDE * sine(freq, t, 0.0))
            .sum();
        *sample += pad as f32;
    }

    fade(&mut out, sample_rate, DEFAULT_FADE_SECS);
    AudioBuffer::from_mono(out, sample_rate)
}
