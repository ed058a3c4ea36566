// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GazerError {
    #[error("timeout must be more than 0 (got {0})")]
    InvalidTimeout(i64),

    #[error("too many watch directories (more than {max})")]
    TooManyWatchDirs { max: usize },

    #[error("gazer is already running (event stream taken)")]
    AlreadyRunning,

    #[error("file watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Why a single sub-command did not complete successfully.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to parse command: {0}")]
    Parse(#[from] shell_words::ParseError),

    #[error("empty command")]
    EmptyCommand,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("timeout ({}ms)", .0.as_millis())]
    Timeout(std::time::Duration),

    #[error("exitCode:{code}")]
    NonZeroExit {
        code: i32,
        elapsed: std::time::Duration,
    },

    #[error("terminated by signal")]
    Terminated { elapsed: std::time::Duration },

    #[error("process runner vanished before reporting")]
    Lost,
}

impl InvokeError {
    /// Time the process ran, when it ran at all.
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        match self {
            InvokeError::Timeout(elapsed)
            | InvokeError::NonZeroExit { elapsed, .. }
            | InvokeError::Terminated { elapsed } => Some(*elapsed),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GazerError>;
