// src/logging.rs

//! Logging setup for `worldbup` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WORLDBUP_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Everything goes to the dedicated log file; the tool is normally run from
//! cron, so nobody watches stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::cli::LogLevel;
use crate::errors::{Result, WorldbupError};

pub const LOG_ENV: &str = "WORLDBUP_LOG";

/// Open `path` for appending and install it as the global log sink.
///
/// A log file that cannot be opened is the one fatal startup error.
pub fn init_logging(path: &Path, cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WorldbupError::Startup {
            path: path.to_path_buf(),
            source,
        })?;

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| WorldbupError::Other(anyhow::anyhow!("installing log subscriber: {e}")))?;

    Ok(())
}

pub fn resolve_level(cli_level: Option<LogLevel>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
