//! Audio Engine Module
//!
//! Core audio types and file handling:
//! - Audio buffer management
//! - WAV / compressed audio import, 16-bit WAV export

pub mod buffer;
pub mod io;

pub use buffer::{
    calculate_peak, calculate_rms, linear_to_db, AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE,
};
pub use io::{export_wav, export_wav_atomic, import_audio, probe_duration, resample};
