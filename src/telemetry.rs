// ============================================================
// Layer 0 — Logging Setup
// ============================================================
// One global subscriber for the process:
//
//   stderr            human-readable fmt layer
//   <log_dir>/corpus-prep.log   same events, no ANSI colours
//                               (only when logging.log_dir is set)
//
// The filter comes from RUST_LOG when present, otherwise from
// logging.level in the YAML config.
//
// Components never call this; they receive a `tracing::Span`
// and log inside it, so a library caller can install its own
// subscriber instead.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

pub const LOG_FILE: &str = "corpus-prep.log";

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let file_layer = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;
            let path = dir.join(LOG_FILE);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file '{}'", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}
