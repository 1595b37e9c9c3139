//! Error handling for Somnus
//!
//! Recoverable kinds (`AcquisitionFailure`, `CompositionFailure`) are consumed
//! by the fallback dispatchers and only ever reach the caller wrapped inside
//! `TerminalFailure`.

use thiserror::Error;

/// Result type alias for Somnus operations
pub type Result<T> = std::result::Result<T, SomnusError>;

/// Main error type for Somnus operations
#[derive(Error, Debug)]
pub enum SomnusError {
    // Request Errors
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // External Tool Errors
    #[error("Remote fetch failed: {reason}")]
    FetchFailed { reason: String },

    #[error("Encoder failed: {reason}")]
    EncoderFailed { reason: String },

    // Fallback Chain Errors
    #[error("Acquisition step '{step}' failed: {reason}")]
    AcquisitionFailure { step: String, reason: String },

    #[error("Composition tier '{tier}' failed: {source}")]
    CompositionFailure {
        tier: String,
        #[source]
        source: Box<SomnusError>,
    },

    #[error("All composition tiers failed ({attempts} attempted); last cause: {source}")]
    TerminalFailure {
        attempts: usize,
        #[source]
        source: Box<SomnusError>,
    },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SomnusError {
    /// Shorthand for an `InvalidRequest` with a formatted reason
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        SomnusError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SomnusError::InvalidRequest { .. } => "INVALID_REQUEST",
            SomnusError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SomnusError::InvalidAudio { .. } => "INVALID_AUDIO",
            SomnusError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SomnusError::FetchFailed { .. } => "FETCH_FAILED",
            SomnusError::EncoderFailed { .. } => "ENCODER_FAILED",
            SomnusError::AcquisitionFailure { .. } => "ACQUISITION_FAILURE",
            SomnusError::CompositionFailure { .. } => "COMPOSITION_FAILURE",
            SomnusError::TerminalFailure { .. } => "TERMINAL_FAILURE",
            SomnusError::InvalidConfig { .. } => "INVALID_CONFIG",
            SomnusError::Io(_) => "IO_ERROR",
            SomnusError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recovered locally by a fallback chain
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SomnusError::AcquisitionFailure { .. }
                | SomnusError::CompositionFailure { .. }
                | SomnusError::FetchFailed { .. }
                | SomnusError::EncoderFailed { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SomnusError::InvalidRequest { .. } => vec![
                "Durations must be positive numbers of seconds",
                "Run 'somnus-cli categories' to list valid music categories",
            ],
            SomnusError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            SomnusError::InvalidAudio { .. } | SomnusError::UnsupportedFormat { .. } => vec![
                "Try converting the file to WAV format first",
                "Supported formats: WAV, MP3, AAC, M4A",
            ],
            SomnusError::FetchFailed { .. } => vec![
                "Install yt-dlp or disable remote fetching",
                "Place your own 'background_music.mp3' in the output folder",
            ],
            SomnusError::EncoderFailed { .. } | SomnusError::TerminalFailure { .. } => vec![
                "Check that ffmpeg is installed and on PATH",
                "Verify the background image can be opened",
                "Try a PNG or JPEG image with even pixel dimensions",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SomnusError::invalid_request("duration must be positive");
        assert_eq!(err.error_code(), "INVALID_REQUEST");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_terminal_failure_keeps_cause() {
        let err = SomnusError::TerminalFailure {
            attempts: 3,
            source: Box::new(SomnusError::EncoderFailed {
                reason: "exit status 1".to_string(),
            }),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Encoder failed: exit status 1"));
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_composition_failure_is_recoverable() {
        let err = SomnusError::CompositionFailure {
            tier: "full-mix".to_string(),
            source: Box::new(SomnusError::EncoderFailed {
                reason: "boom".to_string(),
            }),
        };
        assert!(err.is_recoverable());
    }
}
