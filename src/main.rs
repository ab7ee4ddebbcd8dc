//! Kiln - keeps a single-concurrency compiler worker fed from a watched
//! source tree.

mod actor;
mod cli;
mod config;
mod coordinator;
mod core;
mod logger;
mod protocol;
mod utils;
mod walk;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ProjectConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(ProjectConfig::load(cli)?);

    // Single control thread: every actor and walk task is interleaved here.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Watch { .. } => cli::watch::watch(config).await,
            Commands::Check { .. } => cli::check::check(&config).await,
            Commands::Hover { location, .. } => cli::hover::hover(&config, location).await,
        }
    });

    // Don't wait for a stdin read stuck on the blocking pool.
    runtime.shutdown_background();
    result
}
