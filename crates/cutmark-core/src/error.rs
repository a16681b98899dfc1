//! Error types for cutmark.

use thiserror::Error;

/// Main error type for cutmark operations.
#[derive(Error, Debug)]
pub enum CutmarkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Probe error: {0}")]
    Probe(String),

    /// Neither index strategy produced timestamps, or the extractor failed.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// Malformed or unreadable index cache entry.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Index build already running for {0}")]
    BuildInProgress(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),
}

/// Result type alias for cutmark operations.
pub type Result<T> = std::result::Result<T, CutmarkError>;
