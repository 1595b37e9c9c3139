//! Background Music Acquisition
//!
//! Decides where a video's background track comes from:
//!
//! 1. A track already sitting in the output directory
//! 2. A remote download (optional)
//! 3. Local synthesis
//! 4. A placeholder (silent WAV or instructions file)
//!
//! Downloads and syntheses are written under a conventional name, so a
//! repeated run picks them up in step 1.

mod category;
mod existing;
mod placeholder;
mod policy;
mod remote;
mod track;

pub use category::MusicCategory;
pub use existing::{find_existing_track, CANDIDATE_EXTENSIONS, CANDIDATE_NAMES};
pub use placeholder::{instructions_text, PlaceholderMode, INSTRUCTIONS_FILE};
pub use policy::{MusicAcquisitionPolicy, FETCHED_TRACK_FILE, SYNTHESIZED_TRACK_FILE};
pub use remote::{choose_source, source_pool, CommandFetcher, RemoteFetcher};
pub use track::{Acquisition, AcquisitionOutcome, AcquisitionStep, TrackOrigin, TrackReference};
