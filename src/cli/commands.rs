//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::{info, warn};

use crate::acquisition::{AcquisitionOutcome, MusicAcquisitionPolicy, MusicCategory};
use crate::compositor::AudioVideoCompositor;
use crate::config::SomnusConfig;
use crate::engine::{export_wav_atomic, import_audio};
use crate::error::Result;
use crate::synth::{synthesize, SoundscapeKind, SynthesisRequest};

/// Print every music category with its description.
pub fn list_categories() -> Result<()> {
    for category in MusicCategory::ALL {
        println!("{:<12} {}", category.as_str(), category.description());
    }
    Ok(())
}

/// Synthesize a soundscape and write it as 16-bit WAV.
pub fn synth(
    config: &SomnusConfig,
    kind: &str,
    duration: f64,
    output: &Path,
    seed: Option<u64>,
) -> Result<()> {
    let kind: SoundscapeKind = kind.parse()?;
    let request = SynthesisRequest::new(duration, kind, config.sample_rate)?;
    let seed = seed.or(config.seed).unwrap_or_else(rand::random);
    info!("Synthesizing {} for {:.1}s (seed {})", kind, duration, seed);

    let buffer = synthesize(&request, seed);
    export_wav_atomic(&buffer, output)?;

    println!("Wrote {} ({:.1}s, seed {})", output.display(), buffer.duration_secs(), seed);
    Ok(())
}

/// Run the acquisition chain and report the resulting track.
pub fn acquire(config: &SomnusConfig, category: &str, duration: f64, json: bool) -> Result<()> {
    info!("Acquiring {} music for {:.1}s", category, duration);

    let policy = MusicAcquisitionPolicy::new(config);
    let acquisition = policy.acquire(duration, category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&acquisition)?);
        return Ok(());
    }

    match &acquisition.outcome {
        AcquisitionOutcome::Acquired { step } => {
            println!("Background track ({}): {:?}", step.as_str(), acquisition.reference.location)
        }
        AcquisitionOutcome::NoMusicRequested => println!("No background music requested"),
        AcquisitionOutcome::SilentTrack => {
            println!("No track available; wrote a silent placeholder")
        }
        AcquisitionOutcome::Instructions { path } => {
            println!("No track available; see {}", path.display())
        }
        AcquisitionOutcome::PlaceholderFailed => {
            warn!("No track available and no placeholder could be written")
        }
    }
    Ok(())
}

/// Acquire music for a narration and render the video.
pub fn compose(
    config: &SomnusConfig,
    narration: &Path,
    image: &Path,
    output: &Path,
    category: &str,
) -> Result<()> {
    info!("Composing {} from {}", output.display(), narration.display());

    let narration = import_audio(narration)?;
    let policy = MusicAcquisitionPolicy::new(config);
    let track = policy.produce_background_track(narration.duration_secs(), category)?;

    let compositor = AudioVideoCompositor::new(config);
    let composition = compositor.compose_video(&narration, &track, image, output)?;

    for failure in &composition.failures {
        warn!("{}", failure);
    }
    println!(
        "Video created: {} ({} tier, {:.1}s)",
        composition.output.display(),
        composition.tier,
        narration.duration_secs()
    );
    Ok(())
}
