//! Remote background-track download
//!
//! The download itself is delegated to an external tool (`yt-dlp` by
//! default). Every failure mode surfaces as `FetchFailed`; the policy turns
//! that into a logged step failure and moves on.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::MusicCategory;
use crate::config::RemoteFetchConfig;
use crate::error::{Result, SomnusError};

/// Tracks shorter than this are cut by the tool's post-processor
const LENGTH_CAP_THRESHOLD_SECS: f64 = 600.0;

/// Extra seconds downloaded beyond the requested duration
const LENGTH_CAP_MARGIN_SECS: f64 = 60.0;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const AMBIENT_POOL: &[&str] = &[
    "https://www.youtube.com/watch?v=jfKfPfyJRdk",
    "https://www.youtube.com/watch?v=5qap5aO4i9A",
    "https://www.youtube.com/watch?v=DWcJFNfaw9c",
];

const NATURE_POOL: &[&str] = &[
    "https://www.youtube.com/watch?v=eKFTSSKCzWA",
    "https://www.youtube.com/watch?v=wzjWIxXBs_s",
    "https://www.youtube.com/watch?v=nDq6TstdEi8",
];

const MEDITATION_POOL: &[&str] = &[
    "https://www.youtube.com/watch?v=1ZYbU82GVz4",
    "https://www.youtube.com/watch?v=IP2l7OaArNc",
    "https://www.youtube.com/watch?v=kHnFzEa_5y8",
];

const PIANO_POOL: &[&str] = &[
    "https://www.youtube.com/watch?v=jgpJVI3tDbY",
    "https://www.youtube.com/watch?v=1SoqcMeRqbY",
    "https://www.youtube.com/watch?v=YQaV2EQIed8",
];

const SPACE_POOL: &[&str] = &[
    "https://www.youtube.com/watch?v=4-7IOZUG4qw",
    "https://www.youtube.com/watch?v=K_YXUWCuKCQ",
    "https://www.youtube.com/watch?v=1EqOZkw7rq8",
];

/// Curated long-form sources for a category
///
/// Categories without their own pool share the ambient one.
pub fn source_pool(category: MusicCategory) -> &'static [&'static str] {
    match category {
        MusicCategory::Nature => NATURE_POOL,
        MusicCategory::Meditation => MEDITATION_POOL,
        MusicCategory::Piano => PIANO_POOL,
        MusicCategory::Space => SPACE_POOL,
        _ => AMBIENT_POOL,
    }
}

/// Pick one source for a category at random
pub fn choose_source<R: Rng + ?Sized>(category: MusicCategory, rng: &mut R) -> &'static str {
    let pool = source_pool(category);
    pool.choose(rng).copied().unwrap_or(AMBIENT_POOL[0])
}

/// Something that can place a downloaded audio file at a destination path
pub trait RemoteFetcher: Send + Sync {
    /// Download `source`, covering at least `duration_secs`, to `destination`
    ///
    /// Implementations must not leave a partial file at `destination` when
    /// they fail.
    fn fetch(&self, source: &str, duration_secs: f64, destination: &Path) -> Result<()>;

    /// Fetcher name for logs
    fn name(&self) -> &str;
}

/// Fetcher backed by an external download program
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl CommandFetcher {
    pub fn new(config: &RemoteFetchConfig) -> Self {
        Self {
            program: config.program.clone(),
            timeout: config.timeout(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Check that the program runs at all before committing to a download
    fn check_available(&self) -> Result<()> {
        let child = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| fetch_failed(format!("{} is not available: {}", self.program, e)))?;

        match wait_with_timeout(child, self.probe_timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(fetch_failed(format!(
                "{} --version exited with {}",
                self.program, status
            ))),
            None => Err(fetch_failed(format!(
                "{} --version did not answer within {:?}",
                self.program, self.probe_timeout
            ))),
        }
    }

    /// Argument list for one download into `work_dir`
    pub fn download_args(source: &str, duration_secs: f64, work_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            "192K".into(),
            "--max-downloads".into(),
            "1".into(),
            "--no-playlist".into(),
            "--output".into(),
            work_dir.join("%(title)s.%(ext)s").to_string_lossy().into_owned(),
            source.into(),
        ];
        if duration_secs < LENGTH_CAP_THRESHOLD_SECS {
            let cap = (duration_secs + LENGTH_CAP_MARGIN_SECS) as u64;
            args.push("--postprocessor-args".into());
            args.push(format!("ffmpeg:-t {}", cap));
        }
        args
    }
}

impl RemoteFetcher for CommandFetcher {
    fn fetch(&self, source: &str, duration_secs: f64, destination: &Path) -> Result<()> {
        self.check_available()?;

        let work_dir = tempfile::tempdir()?;
        let log_path = work_dir.path().join("fetch.log");
        let log = File::create(&log_path)?;
        let args = Self::download_args(source, duration_secs, work_dir.path());
        debug!(program = %self.program, ?args, "starting download");

        let child = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| fetch_failed(format!("failed to start {}: {}", self.program, e)))?;

        match wait_with_timeout(child, self.timeout)? {
            Some(status) if status.success() => {}
            Some(status) => {
                let detail = std::fs::read_to_string(&log_path).unwrap_or_default();
                return Err(fetch_failed(format!(
                    "{} exited with {}: {}",
                    self.program,
                    status,
                    last_line(&detail)
                )));
            }
            None => {
                return Err(fetch_failed(format!(
                    "download timed out after {:?}",
                    self.timeout
                )))
            }
        }

        let downloaded = find_mp3(work_dir.path())
            .ok_or_else(|| fetch_failed("no audio file found after download".to_string()))?;

        let temp_path = crate::engine::io::partial_path(destination);
        if let Err(e) = std::fs::copy(&downloaded, &temp_path)
            .and_then(|_| std::fs::rename(&temp_path, destination))
        {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Wait for a child, killing it once `timeout` has elapsed
///
/// Returns `None` when the child had to be killed.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            if let Err(e) = child.kill() {
                warn!(error = %e, "failed to kill timed out process");
            }
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn find_mp3(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("mp3"))
                .unwrap_or(false)
        })
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no output")
}

fn fetch_failed(reason: String) -> SomnusError {
    SomnusError::FetchFailed { reason }
}
