//! CLI Module
//!
//! Command-line interface for the Somnus soundscape and video tools.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Somnus - procedural sleep soundscapes and narrated still-image videos
#[derive(Parser, Debug)]
#[command(name = "somnus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available music categories
    #[command(name = "categories")]
    Categories,

    /// Synthesize a soundscape straight to a WAV file
    #[command(name = "synth")]
    Synth {
        /// Soundscape: nature, drone, bells or ambient-mix
        kind: String,

        /// Duration in seconds
        #[arg(short, long)]
        duration: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Acquire a background track for a video
    #[command(name = "acquire")]
    Acquire {
        /// Music category (see `categories`)
        category: String,

        /// Duration in seconds
        #[arg(short, long)]
        duration: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compose a narrated video over a still image
    #[command(name = "compose")]
    Compose {
        /// Narration audio file
        #[arg(short, long)]
        narration: PathBuf,

        /// Still image
        #[arg(short, long)]
        image: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// Music category; the narration length decides the duration
        #[arg(short = 'm', long, default_value = "ambient")]
        category: String,
    },
}
