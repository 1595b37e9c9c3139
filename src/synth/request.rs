//! Synthesis request and soundscape kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_SAMPLE_RATE;
use crate::error::{Result, SomnusError};

/// The four procedurally generated soundscapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundscapeKind {
    /// Filtered wind and water noise with faint tonal chirps
    Nature,
    /// Low harmonic drone with slow vibrato
    Drone,
    /// Sparse decaying bell strikes over a quiet pad
    Bells,
    /// Weighted blend of the other three
    AmbientMix,
}

impl SoundscapeKind {
    pub const ALL: [SoundscapeKind; 4] = [
        SoundscapeKind::Nature,
        SoundscapeKind::Drone,
        SoundscapeKind::Bells,
        SoundscapeKind::AmbientMix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundscapeKind::Nature => "nature",
            SoundscapeKind::Drone => "drone",
            SoundscapeKind::Bells => "bells",
            SoundscapeKind::AmbientMix => "ambient-mix",
        }
    }
}

impl fmt::Display for SoundscapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundscapeKind {
    type Err = SomnusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nature" => Ok(SoundscapeKind::Nature),
            "drone" => Ok(SoundscapeKind::Drone),
            "bells" => Ok(SoundscapeKind::Bells),
            "ambient-mix" | "ambient_mix" | "ambient" => Ok(SoundscapeKind::AmbientMix),
            other => Err(SomnusError::invalid_request(format!(
                "unknown soundscape '{}' (expected nature, drone, bells or ambient-mix)",
                other
            ))),
        }
    }
}

/// Longest track that will be synthesized or written, in seconds (24 h)
pub const MAX_DURATION_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Reject durations that are not a positive number of seconds up to
/// [`MAX_DURATION_SECS`]
///
/// # Errors
/// `InvalidRequest` for zero, negative, non-finite or oversized durations.
pub fn validate_duration(duration_secs: f64) -> Result<()> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(SomnusError::invalid_request(format!(
            "duration must be a positive number of seconds, got {}",
            duration_secs
        )));
    }
    if duration_secs > MAX_DURATION_SECS {
        return Err(SomnusError::invalid_request(format!(
            "duration of {} seconds exceeds the {} second maximum",
            duration_secs, MAX_DURATION_SECS
        )));
    }
    Ok(())
}

/// A validated, immutable request for one synthesized track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisRequest {
    duration_secs: f64,
    kind: SoundscapeKind,
    sample_rate: u32,
}

impl SynthesisRequest {
    /// Validate and build a request
    ///
    /// # Errors
    /// `InvalidRequest` for a duration rejected by [`validate_duration`] or a
    /// zero sample rate. Nothing is allocated before this check.
    pub fn new(duration_secs: f64, kind: SoundscapeKind, sample_rate: u32) -> Result<Self> {
        validate_duration(duration_secs)?;
        if sample_rate == 0 {
            return Err(SomnusError::invalid_request("sample rate must be non-zero"));
        }
        Ok(Self {
            duration_secs,
            kind,
            sample_rate,
        })
    }

    /// Request at the 44.1kHz baseline rate
    pub fn at_default_rate(duration_secs: f64, kind: SoundscapeKind) -> Result<Self> {
        Self::new(duration_secs, kind, DEFAULT_SAMPLE_RATE)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn kind(&self) -> SoundscapeKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples the synthesized buffer will hold
    pub fn sample_count(&self) -> usize {
        (self.duration_secs * self.sample_rate as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.0 ; "zero")]
    #[test_case(-5.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    #[test_case(1e300 ; "astronomical")]
    #[test_case(MAX_DURATION_SECS + 1.0 ; "just over a day")]
    fn test_rejects_bad_duration(duration: f64) {
        let err = SynthesisRequest::new(duration, SoundscapeKind::Nature, 44100).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_accepts_a_full_day() {
        let request =
            SynthesisRequest::new(MAX_DURATION_SECS, SoundscapeKind::Drone, 8000).unwrap();
        assert_eq!(request.sample_count(), 691_200_000);
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert!(SynthesisRequest::new(1.0, SoundscapeKind::Bells, 0).is_err());
    }

    #[test]
    fn test_sample_count() {
        let request = SynthesisRequest::at_default_rate(10.0, SoundscapeKind::Nature).unwrap();
        assert_eq!(request.sample_count(), 441_000);
    }

    #[test]
    fn test_kind_parsing() {
        for kind in SoundscapeKind::ALL {
            assert_eq!(kind.as_str().parse::<SoundscapeKind>().unwrap(), kind);
        }
        assert!("polka".parse::<SoundscapeKind>().is_err());
    }
}
