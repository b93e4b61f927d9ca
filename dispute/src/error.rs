//! Errors returned by the dispute engine.

use crate::collaborators::CollaboratorError;
use layer_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisputeError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("already done: {0}")]
    AlreadyDone(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("invalid fee: {0}")]
    InvalidFee(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("reward is zero")]
    ZeroReward,

    #[error("voter power is zero")]
    ZeroVoterPower,

    /// A computation that cannot fail for well-formed state did.
    #[error("arithmetic invariant violated: {0}")]
    Arithmetic(&'static str),

    #[error("storage error: {0}")]
    Store(StoreError),

    #[error("collaborator rejected call: {0}")]
    Collaborator(CollaboratorError),
}

impl DisputeError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Invariant violations and backend failures, as opposed to requests a
    /// user could correct and resubmit.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Arithmetic(_) | Self::Store(_))
    }
}

impl From<StoreError> for DisputeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table, key } => Self::NotFound { kind: table, key },
            other => Self::Store(other),
        }
    }
}

impl From<CollaboratorError> for DisputeError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::InsufficientFunds(msg) => Self::InsufficientFunds(msg),
            CollaboratorError::NotFound(key) => Self::NotFound {
                kind: "collaborator record",
                key,
            },
            other => Self::Collaborator(other),
        }
    }
}
