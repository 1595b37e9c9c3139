//! Somnus CLI
//!
//! Command-line interface for soundscape synthesis and video composition.

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use somnus::cli::{commands, Cli, Commands};
use somnus::config::SomnusConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Somnus v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => SomnusConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SomnusConfig::default(),
    };
    config
        .apply_overrides(|key| std::env::var(key).ok())
        .context("applying SOMNUS_* environment overrides")?;

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Somnus v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &SomnusConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Categories => commands::list_categories()?,
        Commands::Synth {
            kind,
            duration,
            output,
            seed,
        } => commands::synth(config, &kind, duration, &output, seed)
            .with_context(|| format!("synthesizing {}", output.display()))?,
        Commands::Acquire {
            category,
            duration,
            json,
        } => commands::acquire(config, &category, duration, json)?,
        Commands::Compose {
            narration,
            image,
            output,
            category,
        } => commands::compose(config, &narration, &image, &output, &category)
            .with_context(|| format!("composing {}", output.display()))?,
    }
    Ok(())
}
