//! Error types for flowstate-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A capability was requested from the registry but never registered.
    ///
    /// This is a configuration error and surfaces at composition time.
    #[error("Unresolved capability: {capability}")]
    Unresolved { capability: &'static str },

    #[error("Action event not found: {0}")]
    EventNotFound(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
