//! Diagnostic logging to stderr
//!
//! Report content goes to stdout; pipeline progress goes through `tracing`
//! so it can be filtered without mixing into the tables.

use std::io;

use anyhow::anyhow;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level selected by the number of `-v` flags.
#[must_use]
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the verbosity flag when it is set.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let level = level_from_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
