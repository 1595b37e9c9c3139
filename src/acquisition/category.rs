//! Caller-facing music categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SomnusError};
use crate::synth::SoundscapeKind;

/// Background music category requested for a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicCategory {
    Ambient,
    Nature,
    Drone,
    Bells,
    Meditation,
    Piano,
    Space,
    /// Explicit request for no background music
    Silence,
}

impl MusicCategory {
    pub const ALL: [MusicCategory; 8] = [
        MusicCategory::Ambient,
        MusicCategory::Nature,
        MusicCategory::Drone,
        MusicCategory::Bells,
        MusicCategory::Meditation,
        MusicCategory::Piano,
        MusicCategory::Space,
        MusicCategory::Silence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MusicCategory::Ambient => "ambient",
            MusicCategory::Nature => "nature",
            MusicCategory::Drone => "drone",
            MusicCategory::Bells => "bells",
            MusicCategory::Meditation => "meditation",
            MusicCategory::Piano => "piano",
            MusicCategory::Space => "space",
            MusicCategory::Silence => "silence",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            MusicCategory::Ambient => "Mixed ambient soundscape with nature and drone elements",
            MusicCategory::Nature => "Nature sounds with wind and water",
            MusicCategory::Drone => "Deep harmonic drone tones",
            MusicCategory::Bells => "Soft bell tones with ambient pad",
            MusicCategory::Meditation => "Calm meditation and zen music",
            MusicCategory::Piano => "Peaceful piano melodies",
            MusicCategory::Space => "Deep space and cosmic ambient sounds",
            MusicCategory::Silence => "No background music",
        }
    }

    /// Soundscape used when the track has to be synthesized locally
    ///
    /// Categories without a dedicated synthesizer fall back to the ambient
    /// mix. `Silence` has none.
    pub fn soundscape(&self) -> Option<SoundscapeKind> {
        match self {
            MusicCategory::Nature => Some(SoundscapeKind::Nature),
            MusicCategory::Drone => Some(SoundscapeKind::Drone),
            MusicCategory::Bells => Some(SoundscapeKind::Bells),
            MusicCategory::Ambient
            | MusicCategory::Meditation
            | MusicCategory::Piano
            | MusicCategory::Space => Some(SoundscapeKind::AmbientMix),
            MusicCategory::Silence => None,
        }
    }

    pub fn is_silence(&self) -> bool {
        matches!(self, MusicCategory::Silence)
    }
}

impl fmt::Display for MusicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MusicCategory {
    type Err = SomnusError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        MusicCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                SomnusError::invalid_request(format!("unknown music category '{}'", s.trim()))
            })
    }
}
