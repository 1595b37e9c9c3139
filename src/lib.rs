//! Somnus - Procedural Sleep Soundscapes and Narrated Video
//!
//! Somnus produces the background layer of long-form relaxation videos:
//! 1. Background music - reuse, download, synthesize, or leave a placeholder
//! 2. Composition - mix narration with the music and render it over a still image
//!
//! # Architecture
//!
//! - `dsp`: noise, zero-phase low-pass, fades, 16-bit quantization
//! - `synth`: nature, drone, bells and ambient-mix soundscapes
//! - `acquisition`: the ordered background-track fallback chain
//! - `compositor`: mixing and tiered video encoding

pub mod acquisition;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod synth;

pub use error::{Result, SomnusError};
