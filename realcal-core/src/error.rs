//! Error types for realcal.

use thiserror::Error;

/// Errors that can occur in realcal operations.
#[derive(Error, Debug)]
pub enum RealCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

/// Result type alias for realcal operations.
pub type RealCalResult<T> = Result<T, RealCalError>;
