//! Narration and background music mixing

use std::path::Path;

use tracing::debug;

use crate::engine::{import_audio, resample, AudioBuffer, ChannelLayout};
use crate::error::Result;

/// Gain applied to the narration
pub const NARRATION_GAIN: f32 = 1.0;

/// Gain applied to the background music
pub const MUSIC_GAIN: f32 = 0.25;

/// Narration plus optional music, reconciled to the narration's format
#[derive(Debug, Clone)]
pub struct MixSpec {
    narration: AudioBuffer,
    music: Option<AudioBuffer>,
}

impl MixSpec {
    /// Take ownership of both buffers
    ///
    /// The music is resampled to the narration's rate, converted to its
    /// channel layout and cut to its length. A shorter music bed is never
    /// padded or looped.
    pub fn new(narration: AudioBuffer, music: Option<AudioBuffer>) -> Self {
        let layout = narration
            .channel_layout()
            .unwrap_or(ChannelLayout::Stereo);
        let target_len = narration.len();
        let music = music.map(|m| {
            let mut m = resample(m, narration.sample_rate).into_layout(layout);
            m.truncate(target_len);
            m
        });
        Self { narration, music }
    }

    pub fn music(&self) -> Option<&AudioBuffer> {
        self.music.as_ref()
    }

    /// `NARRATION_GAIN * narration + MUSIC_GAIN * music`, sample by sample
    ///
    /// Past the end of the shorter buffer only the longer one contributes.
    pub fn mix(self) -> AudioBuffer {
        let Some(music) = self.music else {
            let mut narration = self.narration;
            narration.scale(NARRATION_GAIN);
            return narration;
        };

        let len = self.narration.len().max(music.len());
        let channels = self.narration.channels().max(music.channels());
        let samples = (0..channels)
            .map(|ch| {
                let voice = self.narration.samples.get(ch).map(Vec::as_slice).unwrap_or(&[]);
                let bed = music.samples.get(ch).map(Vec::as_slice).unwrap_or(&[]);
                (0..len)
                    .map(|i| {
                        let v = voice.get(i).copied().unwrap_or(0.0);
                        let b = bed.get(i).copied().unwrap_or(0.0);
                        NARRATION_GAIN * v + MUSIC_GAIN * b
                    })
                    .collect()
            })
            .collect();

        AudioBuffer {
            samples,
            sample_rate: self.narration.sample_rate,
        }
    }
}

/// Decode a background track for mixing
pub fn load_music(path: &Path) -> Result<AudioBuffer> {
    let music = import_audio(path)?;
    debug!(
        path = %path.display(),
        duration_secs = music.duration_secs(),
        sample_rate = music.sample_rate,
        channels = music.channels(),
        "loaded background track"
    );
    Ok(music)
}
