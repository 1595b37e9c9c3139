//! Runtime configuration
//!
//! Defaults, an optional JSON file, then `SOMNUS_*` environment overrides,
//! in that order of precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquisition::PlaceholderMode;
use crate::engine::DEFAULT_SAMPLE_RATE;
use crate::error::{Result, SomnusError};

/// Remote background-track download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteFetchConfig {
    /// Whether the remote step is attempted at all
    pub enabled: bool,
    /// External download tool
    pub program: String,
    /// Hard limit on a single download, after which the tool is killed
    pub timeout_secs: u64,
    /// Limit on the `--version` availability probe
    pub probe_timeout_secs: u64,
}

impl Default for RemoteFetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "yt-dlp".to_string(),
            timeout_secs: 120,
            probe_timeout_secs: 10,
        }
    }
}

impl RemoteFetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Media encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// External encoder executable
    pub program: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub audio_bitrate: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            frame_width: 1920,
            frame_height: 1080,
            fps: 30,
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SomnusConfig {
    /// Rate used for synthesized tracks
    pub sample_rate: u32,
    /// Where background tracks, instructions and videos are written
    pub output_dir: PathBuf,
    /// Fixed synthesis seed; fresh entropy per run when unset
    pub seed: Option<u64>,
    pub remote_fetch: RemoteFetchConfig,
    pub placeholder: PlaceholderMode,
    pub encoder: EncoderConfig,
}

impl Default for SomnusConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            output_dir: PathBuf::from("out"),
            seed: None,
            remote_fetch: RemoteFetchConfig::default(),
            placeholder: PlaceholderMode::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl SomnusConfig {
    /// Read a JSON config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SomnusError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let config: SomnusConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SOMNUS_*` overrides from a lookup function
    ///
    /// Taking the lookup as a closure keeps this testable without mutating
    /// the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SOMNUS_SAMPLE_RATE") {
            self.sample_rate = parse_var("SOMNUS_SAMPLE_RATE", &v)?;
        }
        if let Some(v) = lookup("SOMNUS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOMNUS_SEED") {
            self.seed = Some(parse_var("SOMNUS_SEED", &v)?);
        }
        if let Some(v) = lookup("SOMNUS_REMOTE_FETCH") {
            self.remote_fetch.enabled = parse_flag("SOMNUS_REMOTE_FETCH", &v)?;
        }
        if let Some(v) = lookup("SOMNUS_FETCH_PROGRAM") {
            self.remote_fetch.program = v;
        }
        if let Some(v) = lookup("SOMNUS_FETCH_TIMEOUT_SECS") {
            self.remote_fetch.timeout_secs = parse_var("SOMNUS_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("SOMNUS_PLACEHOLDER") {
            self.placeholder = v.parse()?;
        }
        if let Some(v) = lookup("SOMNUS_ENCODER_PROGRAM") {
            self.encoder.program = v;
        }
        self.validate()
    }

    /// Reject values no pipeline run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid_config("sample_rate must be non-zero"));
        }
        if self.encoder.fps == 0 {
            return Err(invalid_config("encoder.fps must be non-zero"));
        }
        if self.encoder.frame_width == 0 || self.encoder.frame_height == 0 {
            return Err(invalid_config("encoder frame size must be non-zero"));
        }
        if self.remote_fetch.enabled && self.remote_fetch.timeout_secs == 0 {
            return Err(invalid_config("remote_fetch.timeout_secs must be non-zero"));
        }
        Ok(())
    }
}

fn invalid_config(reason: &str) -> SomnusError {
    SomnusError::InvalidConfig {
        reason: reason.to_string(),
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| SomnusError::InvalidConfig {
        reason: format!("{} has an invalid value '{}'", key, value),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SomnusError::InvalidConfig {
            reason: format!("{} must be a boolean, got '{}'", key, value),
        }),
    }
}
