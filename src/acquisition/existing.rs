//! Probe for a background track already present in the output directory

use std::path::{Path, PathBuf};

use tracing::debug;

/// File stems recognised as a background track, in priority order
pub const CANDIDATE_NAMES: [&str; 3] = ["background_music", "music", "bgm"];

/// Extensions recognised for each stem, in priority order
pub const CANDIDATE_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "aac"];

/// First existing candidate, names taking precedence over extensions
pub fn find_existing_track(dir: &Path) -> Option<PathBuf> {
    for name in CANDIDATE_NAMES {
        for ext in CANDIDATE_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", name, ext));
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found existing background track");
                return Some(candidate);
            }
        }
    }
    None
}
