//! Audio/Video Compositor
//!
//! Mixes the narration with an optional background track and renders it
//! against a still image. Encoding degrades through three tiers:
//!
//! - `FullMix`: narration plus music, image fitted to the frame
//! - `NarrationOnly`: narration alone, same framing
//! - `Minimal`: narration alone, image at its native size
//!
//! Each tier encodes to a temporary sibling of the output path and is only
//! renamed into place on success.

mod encoder;
mod mix;

pub use encoder::{EncodeJob, FfmpegEncoder, FrameHandling, MediaEncoder};
pub use mix::{load_music, MixSpec, MUSIC_GAIN, NARRATION_GAIN};

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::acquisition::TrackReference;
use crate::config::{EncoderConfig, SomnusConfig};
use crate::engine::io::partial_path;
use crate::engine::{calculate_peak, linear_to_db, AudioBuffer};
use crate::error::{Result, SomnusError};

/// Composition strategies, most complete first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompositionTier {
    FullMix,
    NarrationOnly,
    Minimal,
}

impl CompositionTier {
    pub const ORDER: [CompositionTier; 3] = [
        CompositionTier::FullMix,
        CompositionTier::NarrationOnly,
        CompositionTier::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionTier::FullMix => "full-mix",
            CompositionTier::NarrationOnly => "narration-only",
            CompositionTier::Minimal => "minimal",
        }
    }

    fn uses_music(&self) -> bool {
        matches!(self, CompositionTier::FullMix)
    }
}

impl fmt::Display for CompositionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished video
#[derive(Debug)]
pub struct Composition {
    pub output: PathBuf,
    pub tier: CompositionTier,
    /// Tiers that failed before `tier` succeeded, as `CompositionFailure`s
    pub failures: Vec<SomnusError>,
}

/// Renders narrated still-image videos
pub struct AudioVideoCompositor {
    encoder: Box<dyn MediaEncoder>,
    frame_width: u32,
    frame_height: u32,
}

impl AudioVideoCompositor {
    /// Compositor using `ffmpeg` as configured
    pub fn new(config: &SomnusConfig) -> Self {
        Self::with_encoder(Box::new(FfmpegEncoder::new(&config.encoder)), &config.encoder)
    }

    pub fn with_encoder(encoder: Box<dyn MediaEncoder>, config: &EncoderConfig) -> Self {
        Self {
            encoder,
            frame_width: config.frame_width,
            frame_height: config.frame_height,
        }
    }

    /// Render `narration` over `image` into `output`
    ///
    /// The narration's duration is the video's duration. Music from `track`
    /// is only used by the first tier; if there is no audible track that
    /// tier is skipped.
    ///
    /// # Errors
    /// `InvalidRequest` for empty narration, `FileNotFound` for a missing
    /// image, and `TerminalFailure` once every tier has failed. Nothing is
    /// left at `output` on failure.
    pub fn compose_video(
        &self,
        narration: &AudioBuffer,
        track: &TrackReference,
        image: &Path,
        output: &Path,
    ) -> Result<Composition> {
        if narration.is_empty() {
            return Err(SomnusError::invalid_request("narration is empty"));
        }
        if !image.is_file() {
            return Err(SomnusError::FileNotFound {
                path: image.display().to_string(),
                source: None,
            });
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let music_path = track.audible_location();
        let duration_secs = narration.duration_secs();
        info!(
            duration_secs,
            music = ?music_path,
            encoder = self.encoder.name(),
            "composing video"
        );

        let tiers = CompositionTier::ORDER
            .into_iter()
            .filter(|tier| !tier.uses_music() || music_path.is_some());

        let mut failures = Vec::new();
        for tier in tiers {
            match self.run_tier(tier, narration, music_path, image, output) {
                Ok(()) => {
                    info!(%tier, output = %output.display(), "video composed");
                    return Ok(Composition {
                        output: output.to_path_buf(),
                        tier,
                        failures,
                    });
                }
                Err(cause) => {
                    warn!(%tier, error = %cause, "composition tier failed");
                    failures.push(SomnusError::CompositionFailure {
                        tier: tier.as_str().to_string(),
                        source: Box::new(cause),
                    });
                }
            }
        }

        let attempts = failures.len();
        let last = failures.pop().unwrap_or_else(|| SomnusError::EncoderFailed {
            reason: "no composition tier was attempted".to_string(),
        });
        Err(SomnusError::TerminalFailure {
            attempts,
            source: Box::new(last),
        })
    }

    fn run_tier(
        &self,
        tier: CompositionTier,
        narration: &AudioBuffer,
        music_path: Option<&Path>,
        image: &Path,
        output: &Path,
    ) -> Result<()> {
        let music = match music_path {
            Some(path) if tier.uses_music() => Some(load_music(path)?),
            _ => None,
        };
        let audio = MixSpec::new(narration.clone(), music).mix();
        debug!(
            %tier,
            peak_db = linear_to_db(calculate_peak(&audio)),
            "mix ready for encoding"
        );

        let frame = match tier {
            CompositionTier::Minimal => FrameHandling::Native,
            _ => FrameHandling::Fit {
                width: self.frame_width,
                height: self.frame_height,
            },
        };

        let temp_path = partial_path(output);
        let job = EncodeJob {
            audio: &audio,
            image,
            duration_secs: narration.duration_secs(),
            frame,
            output: &temp_path,
        };

        let result = self.encoder.encode(&job).and_then(|()| {
            if !temp_path.is_file() {
                return Err(SomnusError::EncoderFailed {
                    reason: format!("{} produced no output", self.encoder.name()),
                });
            }
            std::fs::rename(&temp_path, output).map_err(SomnusError::from)
        });
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::TrackOrigin;
    use crate::engine::{export_wav, ChannelLayout};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, TempDir};

    /// Records every job and fails the first `fail_first` of them
    #[derive(Clone)]
    struct ScriptedEncoder {
        fail_first: usize,
        jobs: Arc<Mutex<Vec<(FrameHandling, AudioBuffer)>>>,
    }

    impl ScriptedEncoder {
        fn failing(fail_first: usize) -> Self {
            Self {
                fail_first,
                jobs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn jobs(&self) -> Vec<(FrameHandling, AudioBuffer)> {
            self.jobs.lock().unwrap().clone()
        }
    }

    impl MediaEncoder for ScriptedEncoder {
        fn encode(&self, job: &EncodeJob<'_>) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.push((job.frame, job.audio.clone()));
            // The partial file exists even when the encoder gives up halfway
            std::fs::write(job.output, b"mp4")?;
            if jobs.len() <= self.fail_first {
                return Err(SomnusError::EncoderFailed {
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let image = dir.path().join("background.png");
        std::fs::write(&image, b"png").unwrap();
        let output = dir.path().join("video.mp4");
        (dir, image, output)
    }

    fn narration(secs: usize) -> AudioBuffer {
        AudioBuffer::from_mono(vec![0.1; secs * 100], 100)
    }

    fn music_track(dir: &Path, secs: usize) -> TrackReference {
        let path = dir.join("background_music.wav");
        export_wav(&AudioBuffer::from_mono(vec![0.4; secs * 100], 100), &path).unwrap();
        TrackReference::at(TrackOrigin::Synthesized, path, Some(secs as f64))
    }

    fn compositor(encoder: &ScriptedEncoder) -> AudioVideoCompositor {
        AudioVideoCompositor::with_encoder(Box::new(encoder.clone()), &EncoderConfig::default())
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".partial"))
            .collect()
    }

    #[test]
    fn test_full_mix_first() {
        let (dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(0);
        let track = music_track(dir.path(), 45);

        let composition = compositor(&encoder)
            .compose_video(&narration(60), &track, &image, &output)
            .unwrap();

        assert_eq!(composition.tier, CompositionTier::FullMix);
        assert!(composition.failures.is_empty());
        assert!(output.is_file());

        let jobs = encoder.jobs();
        let (frame, audio) = &jobs[0];
        assert_eq!(
            *frame,
            FrameHandling::Fit {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(audio.len(), 6000);
        assert!((audio.channel(0)[100] - (0.1 + 0.25 * 0.4)).abs() < 1e-3);
        assert_eq!(audio.channel(0)[5000], 0.1);
    }

    #[test]
    fn test_falls_back_to_narration_only() {
        let (dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(1);
        let track = music_track(dir.path(), 10);

        let composition = compositor(&encoder)
            .compose_video(&narration(5), &track, &image, &output)
            .unwrap();

        assert_eq!(composition.tier, CompositionTier::NarrationOnly);
        assert_eq!(composition.failures.len(), 1);
        assert_eq!(composition.failures[0].error_code(), "COMPOSITION_FAILURE");
        assert!(leftovers(dir.path()).is_empty());

        let jobs = encoder.jobs();
        assert_eq!(jobs[1].1, narration(5));
    }

    #[test]
    fn test_no_music_starts_at_narration_only() {
        let (_dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(0);

        let composition = compositor(&encoder)
            .compose_video(&narration(3), &TrackReference::none(), &image, &output)
            .unwrap();

        assert_eq!(composition.tier, CompositionTier::NarrationOnly);
        assert_eq!(encoder.jobs().len(), 1);
    }

    #[test]
    fn test_unreadable_music_fails_full_mix_only() {
        let (dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(0);
        let bogus = dir.path().join("music.wav");
        std::fs::write(&bogus, b"not a wav").unwrap();
        let track = TrackReference::at(TrackOrigin::ExistingFile, bogus, None);

        let composition = compositor(&encoder)
            .compose_video(&narration(3), &track, &image, &output)
            .unwrap();

        assert_eq!(composition.tier, CompositionTier::NarrationOnly);
        assert_eq!(composition.failures.len(), 1);
    }

    #[test]
    fn test_exhausted_tiers_leave_nothing_behind() {
        let (dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(usize::MAX);
        let track = music_track(dir.path(), 2);

        let err = compositor(&encoder)
            .compose_video(&narration(2), &track, &image, &output)
            .unwrap_err();

        match &err {
            SomnusError::TerminalFailure { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!output.exists());
        assert!(leftovers(dir.path()).is_empty());

        let jobs = encoder.jobs();
        assert_eq!(jobs[2].0, FrameHandling::Native);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (dir, image, output) = setup();
        let encoder = ScriptedEncoder::failing(0);
        let compositor = compositor(&encoder);

        let empty = AudioBuffer::silent(0, ChannelLayout::Mono, 100);
        let err = compositor
            .compose_video(&empty, &TrackReference::none(), &image, &output)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");

        let err = compositor
            .compose_video(
                &narration(1),
                &TrackReference::none(),
                &dir.path().join("missing.png"),
                &output,
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert!(encoder.jobs().is_empty());
    }
}
