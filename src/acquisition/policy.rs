//! The acquisition chain
//!
//! Steps are tried in [`AcquisitionStep::ORDER`]. Each one reports an outcome
//! instead of raising; the first track found wins, and a placeholder is left
//! behind when the whole chain comes up empty.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::existing::find_existing_track;
use super::placeholder::{write_instructions, write_silent_track, INSTRUCTIONS_FILE};
use super::remote::{choose_source, CommandFetcher, RemoteFetcher};
use super::{
    Acquisition, AcquisitionOutcome, AcquisitionStep, MusicCategory, PlaceholderMode,
    TrackOrigin, TrackReference,
};
use crate::config::SomnusConfig;
use crate::engine::{export_wav_atomic, probe_duration};
use crate::error::{Result, SomnusError};
use crate::synth::{synthesize, validate_duration, SynthesisRequest};

/// File name used for downloaded tracks
pub const FETCHED_TRACK_FILE: &str = "background_music.mp3";

/// File name used for synthesized and silent tracks
pub const SYNTHESIZED_TRACK_FILE: &str = "background_music.wav";

/// Result of one step
enum StepOutcome {
    Found(TrackReference),
    Skipped(&'static str),
    Failed(SomnusError),
}

/// Chooses where a video's background track comes from
pub struct MusicAcquisitionPolicy {
    output_dir: PathBuf,
    sample_rate: u32,
    seed: Option<u64>,
    placeholder: PlaceholderMode,
    fetcher: Option<Box<dyn RemoteFetcher>>,
}

impl MusicAcquisitionPolicy {
    /// Build a policy from configuration
    ///
    /// The command-line downloader is installed when remote fetching is
    /// enabled.
    pub fn new(config: &SomnusConfig) -> Self {
        let fetcher: Option<Box<dyn RemoteFetcher>> = if config.remote_fetch.enabled {
            Some(Box::new(CommandFetcher::new(&config.remote_fetch)))
        } else {
            None
        };
        Self {
            output_dir: config.output_dir.clone(),
            sample_rate: config.sample_rate,
            seed: config.seed,
            placeholder: config.placeholder,
            fetcher,
        }
    }

    /// Replace the remote fetcher
    pub fn with_fetcher(mut self, fetcher: Box<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Produce a background track reference for a video
    ///
    /// # Errors
    /// Only `InvalidRequest`, for a bad duration or unknown category. Every
    /// other failure is absorbed by the chain.
    pub fn produce_background_track(
        &self,
        duration_secs: f64,
        category: &str,
    ) -> Result<TrackReference> {
        self.acquire(duration_secs, category)
            .map(|acquisition| acquisition.reference)
    }

    /// Run the chain and report how it ended
    pub fn acquire(&self, duration_secs: f64, category: &str) -> Result<Acquisition> {
        validate_duration(duration_secs)?;
        let category: MusicCategory = category.parse()?;

        if category.is_silence() {
            info!("no background music requested");
            return Ok(Acquisition {
                reference: TrackReference::none(),
                outcome: AcquisitionOutcome::NoMusicRequested,
            });
        }

        for step in AcquisitionStep::ORDER {
            match self.run_step(step, duration_secs, category) {
                StepOutcome::Found(reference) => {
                    info!(
                        step = step.as_str(),
                        location = ?reference.location,
                        "background track acquired"
                    );
                    return Ok(Acquisition {
                        reference,
                        outcome: AcquisitionOutcome::Acquired { step },
                    });
                }
                StepOutcome::Skipped(why) => {
                    debug!(step = step.as_str(), why, "acquisition step skipped");
                }
                StepOutcome::Failed(error) => {
                    warn!(step = step.as_str(), %error, "acquisition step failed");
                }
            }
        }

        Ok(self.leave_placeholder(duration_secs, category))
    }

    fn run_step(
        &self,
        step: AcquisitionStep,
        duration_secs: f64,
        category: MusicCategory,
    ) -> StepOutcome {
        let outcome = match step {
            AcquisitionStep::ExistingTrack => return self.existing_track(),
            AcquisitionStep::RemoteFetch => self.remote_fetch(duration_secs, category),
            AcquisitionStep::Synthesize => self.synthesize(duration_secs, category),
        };
        match outcome {
            Ok(Some(reference)) => StepOutcome::Found(reference),
            Ok(None) => StepOutcome::Skipped("not applicable"),
            Err(e) => StepOutcome::Failed(SomnusError::AcquisitionFailure {
                step: step.as_str().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn existing_track(&self) -> StepOutcome {
        match find_existing_track(&self.output_dir) {
            Some(path) => {
                let duration = probe_duration(&path);
                StepOutcome::Found(TrackReference::at(TrackOrigin::ExistingFile, path, duration))
            }
            None => StepOutcome::Skipped("no existing track"),
        }
    }

    fn remote_fetch(
        &self,
        duration_secs: f64,
        category: MusicCategory,
    ) -> Result<Option<TrackReference>> {
        let Some(fetcher) = &self.fetcher else {
            return Ok(None);
        };

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let source = choose_source(category, &mut rng);
        info!(fetcher = fetcher.name(), source, "fetching background track");

        std::fs::create_dir_all(&self.output_dir)?;
        let destination = self.output_dir.join(FETCHED_TRACK_FILE);
        fetcher.fetch(source, duration_secs, &destination)?;

        if !destination.is_file() {
            return Err(SomnusError::FetchFailed {
                reason: format!("{} reported success but wrote nothing", fetcher.name()),
            });
        }
        let duration = probe_duration(&destination);
        Ok(Some(TrackReference::at(
            TrackOrigin::RemoteFetch,
            destination,
            duration,
        )))
    }

    fn synthesize(
        &self,
        duration_secs: f64,
        category: MusicCategory,
    ) -> Result<Option<TrackReference>> {
        let Some(kind) = category.soundscape() else {
            return Ok(None);
        };
        let request = SynthesisRequest::new(duration_secs, kind, self.sample_rate)?;
        let seed = self.seed.unwrap_or_else(rand::random);
        info!(%kind, seed, "synthesizing background track");

        let buffer = synthesize(&request, seed);
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(SYNTHESIZED_TRACK_FILE);
        export_wav_atomic(&buffer, &path)?;

        Ok(Some(TrackReference::at(
            TrackOrigin::Synthesized,
            path,
            Some(buffer.duration_secs()),
        )))
    }

    /// Last resort; never fails, at worst it returns a bare `none` reference
    fn leave_placeholder(&self, duration_secs: f64, category: MusicCategory) -> Acquisition {
        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            warn!(error = %e, "cannot create output directory for placeholder");
            return bare_none();
        }

        match self.placeholder {
            PlaceholderMode::SilentTrack => {
                let path = self.output_dir.join(SYNTHESIZED_TRACK_FILE);
                match write_silent_track(&path, duration_secs, self.sample_rate) {
                    Ok(()) => {
                        info!(path = %path.display(), "wrote silent placeholder track");
                        Acquisition {
                            reference: TrackReference::at(
                                TrackOrigin::Silence,
                                path,
                                Some(duration_secs),
                            ),
                            outcome: AcquisitionOutcome::SilentTrack,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to write silent placeholder");
                        bare_none()
                    }
                }
            }
            PlaceholderMode::Instructions => {
                let path = self.output_dir.join(INSTRUCTIONS_FILE);
                match write_instructions(&path, category, duration_secs) {
                    Ok(()) => {
                        info!(path = %path.display(), "wrote background music instructions");
                        Acquisition {
                            reference: TrackReference::none(),
                            outcome: AcquisitionOutcome::Instructions { path },
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to write music instructions");
                        bare_none()
                    }
                }
            }
        }
    }
}

fn bare_none() -> Acquisition {
    Acquisition {
        reference: TrackReference::none(),
        outcome: AcquisitionOutcome::PlaceholderFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    struct FailingFetcher {
        calls: Arc<AtomicUsize>,
    }

    impl RemoteFetcher for FailingFetcher {
        fn fetch(&self, _source: &str, _duration_secs: f64, _destination: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SomnusError::FetchFailed {
                reason: "network unreachable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct WritingFetcher;

    impl RemoteFetcher for WritingFetcher {
        fn fetch(&self, source: &str, _duration_secs: f64, destination: &Path) -> Result<()> {
            std::fs::write(destination, source.as_bytes())?;
            Ok(())
        }

        fn name(&self) -> &str {
            "writing"
        }
    }

    fn test_policy(mode: PlaceholderMode) -> (TempDir, MusicAcquisitionPolicy) {
        let dir = tempdir().unwrap();
        let mut config = SomnusConfig::default();
        config.output_dir = dir.path().to_path_buf();
        config.sample_rate = 8000;
        config.seed = Some(11);
        config.remote_fetch.enabled = false;
        config.placeholder = mode;
        let policy = MusicAcquisitionPolicy::new(&config);
        (dir, policy)
    }

    #[test]
    fn test_silence_short_circuits() {
        let (dir, policy) = test_policy(PlaceholderMode::Instructions);
        std::fs::write(dir.path().join("bgm.mp3"), b"x").unwrap();

        let acquisition = policy.acquire(300.0, "silence").unwrap();
        assert_eq!(acquisition.reference, TrackReference::none());
        assert_eq!(acquisition.outcome, AcquisitionOutcome::NoMusicRequested);
    }

    #[test]
    fn test_invalid_requests() {
        let (_dir, policy) = test_policy(PlaceholderMode::Instructions);
        for (duration, category) in [(10.0, "polka"), (0.0, "nature"), (f64::NAN, "nature")] {
            let err = policy.acquire(duration, category).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_REQUEST");
        }
    }

    #[test]
    fn test_oversized_duration_is_rejected_before_any_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (dir, policy) = test_policy(PlaceholderMode::SilentTrack);
        let policy = policy.with_fetcher(Box::new(FailingFetcher {
            calls: Arc::clone(&calls),
        }));

        let err = policy.produce_background_track(1e300, "bells").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join(SYNTHESIZED_TRACK_FILE).exists());
    }

    #[test]
    fn test_existing_track_is_used_verbatim() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (dir, policy) = test_policy(PlaceholderMode::Instructions);
        let policy = policy.with_fetcher(Box::new(FailingFetcher {
            calls: Arc::clone(&calls),
        }));
        let existing = dir.path().join("music.wav");
        std::fs::write(&existing, b"not really audio").unwrap();

        let acquisition = policy.acquire(30.0, "ambient").unwrap();
        assert_eq!(acquisition.reference.origin, TrackOrigin::ExistingFile);
        assert_eq!(acquisition.reference.location, Some(existing));
        assert_eq!(acquisition.reference.duration_secs, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetch_failure_falls_through_to_synthesis() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (dir, policy) = test_policy(PlaceholderMode::Instructions);
        let policy = policy.with_fetcher(Box::new(FailingFetcher {
            calls: Arc::clone(&calls),
        }));

        let acquisition = policy.acquire(3.0, "nature").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            acquisition.outcome,
            AcquisitionOutcome::Acquired {
                step: AcquisitionStep::Synthesize
            }
        );
        assert_eq!(
            acquisition.reference.location,
            Some(dir.path().join(SYNTHESIZED_TRACK_FILE))
        );
        let duration = acquisition.reference.duration_secs.unwrap();
        assert!((duration - 3.0).abs() <= 1.0 / 8000.0);
    }

    #[test]
    fn test_successful_fetch_lands_at_conventional_name() {
        let (dir, policy) = test_policy(PlaceholderMode::Instructions);
        let policy = policy.with_fetcher(Box::new(WritingFetcher));

        let reference = policy.produce_background_track(120.0, "piano").unwrap();
        assert_eq!(reference.origin, TrackOrigin::RemoteFetch);
        let location = dir.path().join(FETCHED_TRACK_FILE);
        assert_eq!(reference.location.as_deref(), Some(location.as_path()));

        let source = std::fs::read_to_string(location).unwrap();
        assert!(source.starts_with("https://"));
    }

    #[test]
    fn test_second_run_reuses_the_persisted_track() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_dir, policy) = test_policy(PlaceholderMode::Instructions);
        let policy = policy.with_fetcher(Box::new(FailingFetcher {
            calls: Arc::clone(&calls),
        }));

        let first = policy.produce_background_track(2.0, "bells").unwrap();
        let second = policy.produce_background_track(2.0, "bells").unwrap();

        assert_eq!(first.origin, TrackOrigin::Synthesized);
        assert_eq!(second.origin, TrackOrigin::ExistingFile);
        assert_eq!(first.location, second.location);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_instructions_placeholder_when_synthesis_cannot_write() {
        let (dir, policy) = test_policy(PlaceholderMode::Instructions);
        // A directory squatting on the track name blocks the rename
        std::fs::create_dir(dir.path().join(SYNTHESIZED_TRACK_FILE)).unwrap();

        let acquisition = policy.acquire(2.0, "drone").unwrap();
        let instructions = dir.path().join(INSTRUCTIONS_FILE);
        assert_eq!(acquisition.reference, TrackReference::none());
        assert_eq!(
            acquisition.outcome,
            AcquisitionOutcome::Instructions {
                path: instructions.clone()
            }
        );
        let text = std::fs::read_to_string(instructions).unwrap();
        assert!(text.contains("You requested: drone music"));
    }

    #[test]
    fn test_failed_placeholder_still_returns_none() {
        let (dir, policy) = test_policy(PlaceholderMode::SilentTrack);
        std::fs::create_dir(dir.path().join(SYNTHESIZED_TRACK_FILE)).unwrap();

        let acquisition = policy.acquire(2.0, "drone").unwrap();
        assert_eq!(acquisition.reference, TrackReference::none());
        assert_eq!(acquisition.outcome, AcquisitionOutcome::PlaceholderFailed);
    }
}
