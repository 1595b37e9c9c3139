//! Terminal fallbacks when no track could be acquired

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::MusicCategory;
use crate::engine::{export_wav_atomic, AudioBuffer, ChannelLayout};
use crate::error::{Result, SomnusError};
use crate::synth::validate_duration;

/// Name of the instructions file written by [`PlaceholderMode::Instructions`]
pub const INSTRUCTIONS_FILE: &str = "ADD_BACKGROUND_MUSIC.txt";

/// What to leave behind once every acquisition step has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderMode {
    /// An all-zero WAV of the requested duration
    SilentTrack,
    /// A text file telling the user how to add music themselves
    #[default]
    Instructions,
}

impl FromStr for PlaceholderMode {
    type Err = SomnusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent-track" | "silent" | "silence" => Ok(PlaceholderMode::SilentTrack),
            "instructions" => Ok(PlaceholderMode::Instructions),
            other => Err(SomnusError::InvalidConfig {
                reason: format!("unknown placeholder mode '{}'", other),
            }),
        }
    }
}

/// Write a silent mono WAV covering `duration_secs`
///
/// # Errors
/// `InvalidRequest` for a duration outside (0, 24 h] or a zero sample rate,
/// checked before anything is allocated.
pub fn write_silent_track(path: &Path, duration_secs: f64, sample_rate: u32) -> Result<()> {
    validate_duration(duration_secs)?;
    if sample_rate == 0 {
        return Err(SomnusError::invalid_request("sample rate must be non-zero"));
    }
    let sample_count = (duration_secs * sample_rate as f64).round() as usize;
    let buffer = AudioBuffer::silent(sample_count, ChannelLayout::Mono, sample_rate);
    export_wav_atomic(&buffer, path)
}

/// Write the add-your-own-music instructions file
pub fn write_instructions(path: &Path, category: MusicCategory, duration_secs: f64) -> Result<()> {
    std::fs::write(path, instructions_text(category, duration_secs, Local::now()))?;
    Ok(())
}

fn suggested_searches(category: MusicCategory) -> [&'static str; 3] {
    match category {
        MusicCategory::Nature => [
            "Search YouTube for: 'free rain sounds for sleep'",
            "Search YouTube for: 'royalty free forest sounds'",
            "Try: 'ocean waves no copyright'",
        ],
        MusicCategory::Meditation => [
            "Search YouTube for: 'free meditation music'",
            "Search YouTube for: 'royalty free zen music'",
            "Try: 'tibetan singing bowls no copyright'",
        ],
        MusicCategory::Piano => [
            "Search YouTube for: 'royalty free piano music peaceful'",
            "Search YouTube for: 'creative commons calm piano'",
            "Try: 'no copyright relaxing piano'",
        ],
        MusicCategory::Space => [
            "Search YouTube for: 'royalty free space ambient'",
            "Search YouTube for: 'creative commons cosmic sounds'",
            "Try: 'no copyright deep space music'",
        ],
        _ => [
            "Search YouTube for: 'royalty free ambient music for meditation'",
            "Search YouTube for: 'creative commons lofi music'",
            "Try: 'peaceful ambient soundscape no copyright'",
        ],
    }
}

/// Body of the instructions file
pub fn instructions_text(
    category: MusicCategory,
    duration_secs: f64,
    created: DateTime<Local>,
) -> String {
    let suggestions: String = suggested_searches(category)
        .iter()
        .enumerate()
        .map(|(i, suggestion)| format!("{}. {}\n", i + 1, suggestion))
        .collect();
    let labels: String = ["Royalty Free", "Creative Commons", "No Copyright", "Free to Use"]
        .iter()
        .map(|label| format!("- '{}'\n", label))
        .collect();

    format!(
        "BACKGROUND MUSIC INSTRUCTIONS\n\
         {rule}\n\
         Created: {created}\n\
         \n\
         You requested: {category} music\n\
         Duration needed: {duration_secs:.1} seconds\n\
         \n\
         TO ADD BACKGROUND MUSIC:\n\
         1. Download a royalty-free music file\n\
         2. Save it as 'background_music.mp3' in this folder\n\
         3. Run the video generator again\n\
         \n\
         SUGGESTED SEARCHES:\n\
         {suggestions}\
         \n\
         NOTE: Make sure the music is labeled as:\n\
         {labels}",
        rule = "=".repeat(50),
        created = created.format("%Y-%m-%d %H:%M:%S"),
    )
}
