// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldbupError {
    /// The dedicated log file could not be opened. Fatal: the process exits 1.
    #[error("cannot open log file {path:?}: {source}")]
    Startup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("server did not answer the liveness probe: {0}")]
    Liveness(#[source] Box<WorldbupError>),

    #[error("command '{command}' was not confirmed within {timeout:?}")]
    VerificationTimeout { command: String, timeout: Duration },

    #[error("failed to send '{command}' to session '{session}': {reason}")]
    Sender {
        session: String,
        command: String,
        reason: String,
    },

    #[error("log watcher failed: {0}")]
    Watcher(#[source] std::io::Error),

    #[error("`{program} {operation}` failed: {detail}")]
    BackupTool {
        program: String,
        operation: String,
        detail: String,
    },

    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorldbupError {
    /// Wrap an I/O error with the path it happened on.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorldbupError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WorldbupError::VerificationTimeout { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WorldbupError>;
