//! Track references and acquisition results

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a background track came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackOrigin {
    ExistingFile,
    RemoteFetch,
    Synthesized,
    Silence,
    None,
}

/// Handle to the background track chosen for one video
///
/// Produced once by the acquisition policy and handed to the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackReference {
    pub origin: TrackOrigin,
    pub location: Option<PathBuf>,
    pub duration_secs: Option<f64>,
}

impl TrackReference {
    /// No background track at all
    pub fn none() -> Self {
        Self {
            origin: TrackOrigin::None,
            location: None,
            duration_secs: None,
        }
    }

    pub fn at(
        origin: TrackOrigin,
        location: impl Into<PathBuf>,
        duration_secs: Option<f64>,
    ) -> Self {
        Self {
            origin,
            location: Some(location.into()),
            duration_secs,
        }
    }

    /// Location of a track worth mixing, if there is one
    ///
    /// Silent tracks and missing tracks both yield `None`.
    pub fn audible_location(&self) -> Option<&Path> {
        match self.origin {
            TrackOrigin::Silence | TrackOrigin::None => None,
            _ => self.location.as_deref(),
        }
    }
}

/// The step of the acquisition chain that produced a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquisitionStep {
    ExistingTrack,
    RemoteFetch,
    Synthesize,
}

impl AcquisitionStep {
    /// Evaluation order of the chain
    pub const ORDER: [AcquisitionStep; 3] = [
        AcquisitionStep::ExistingTrack,
        AcquisitionStep::RemoteFetch,
        AcquisitionStep::Synthesize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionStep::ExistingTrack => "existing-track",
            AcquisitionStep::RemoteFetch => "remote-fetch",
            AcquisitionStep::Synthesize => "synthesize",
        }
    }
}

/// How an acquisition run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AcquisitionOutcome {
    /// A step of the chain produced a usable track
    Acquired { step: AcquisitionStep },
    /// The caller asked for silence
    NoMusicRequested,
    /// Every step failed and a silent WAV was written instead
    SilentTrack,
    /// Every step failed and instructions for adding music were written
    Instructions { path: PathBuf },
    /// Every step failed and not even a placeholder could be written
    PlaceholderFailed,
}

/// Full result of one acquisition run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub reference: TrackReference,
    pub outcome: AcquisitionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_serializes_origin_in_kebab_case() {
        let reference = TrackReference::at(
            TrackOrigin::ExistingFile,
            "out/background_music.mp3",
            Some(12.5),
        );
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["origin"], "existing-file");
        assert_eq!(json["duration_secs"], 12.5);
    }

    #[test]
    fn test_silence_is_not_audible() {
        let silent = TrackReference::at(TrackOrigin::Silence, "out/background_music.wav", None);
        assert!(silent.audible_location().is_none());
        assert!(TrackReference::none().audible_location().is_none());

        let synthesized = TrackReference::at(TrackOrigin::Synthesized, "a.wav", Some(1.0));
        assert_eq!(synthesized.audible_location(), Some(Path::new("a.wav")));
    }
}
