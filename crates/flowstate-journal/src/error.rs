//! Error types for flowstate-journal

use thiserror::Error;

/// Journal error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the core crate (registry or event log)
    #[error(transparent)]
    Core(#[from] flowstate_core::Error),

    /// Replay target beyond the end of the log
    #[error("Replay target {target} out of range for log of {len} events")]
    ReplayOutOfRange { target: usize, len: usize },

    /// Nothing recorded yet
    #[error("Event log is empty")]
    EmptyLog,

    /// Export error
    #[error("Export error: {0}")]
    ExportError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, Error>;
