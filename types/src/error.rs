//! Top-level error type shared across crates.

use thiserror::Error;

/// Validation errors for the shared types.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("unknown dispute category: {0}")]
    UnknownCategory(String),

    #[error("invalid hash id: {0}")]
    InvalidHash(String),

    #[error("unknown vote choice: {0}")]
    UnknownVoteChoice(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
