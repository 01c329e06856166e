use std::path::PathBuf;

use thiserror::Error;

use crate::ensemble::EnsembleResult;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("corrupt record at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("invalid content hash: {hash}")]
    InvalidHash { hash: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store task failed: {0}")]
    TaskFailed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// The verdict was computed but could not be stored.
    #[error("verdict computed but not persisted: {source}")]
    Unpersisted {
        result: Box<EnsembleResult>,
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid content hash: {hash}")]
    InvalidHash { hash: String },
}

impl VerificationError {
    /// The verdict carried by an unpersisted verification, if any.
    pub fn ensemble_result(&self) -> Option<&EnsembleResult> {
        match self {
            VerificationError::Unpersisted { result, .. } => Some(result),
            _ => None,
        }
    }
}
