//! # todo
//!
//! Console front-end for the task tracker: loads settings, installs logging,
//! opens the store, and dispatches one command.

#![deny(unsafe_code)]

mod cli;
mod commands;
mod render;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use todo_settings::TodoSettings;
use todo_store::{DatabaseConfig, TaskStore};
use todo_telemetry::{TelemetryConfig, init_telemetry};
use tracing::debug;
use tracing::level_filters::LevelFilter;

use crate::cli::Cli;
use crate::commands::Runner;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = todo_settings::load_settings().context("failed to load settings")?;
    init_logging(&settings, cli.verbose)?;

    let path = cli
        .db
        .clone()
        .unwrap_or_else(|| settings.database.resolved_path());
    let config = DatabaseConfig::with_busy_timeout_ms(settings.database.busy_timeout_ms);
    let store = TaskStore::open_with(&path, config)
        .with_context(|| format!("failed to open task store at {}", path.display()))?;
    debug!(path = %path.display(), command = ?cli.command, "dispatching");

    let stdout = io::stdout();
    let stdin = io::stdin();
    Runner::new(&store, cli.json, stdout.lock(), stdin.lock()).run(cli.command)
}

fn init_logging(settings: &TodoSettings, verbose: bool) -> Result<()> {
    let mut config = TelemetryConfig::from_settings(&settings.logging)?;
    if verbose {
        config = config.with_level(LevelFilter::DEBUG);
    }
    init_telemetry(&config)?;
    Ok(())
}
