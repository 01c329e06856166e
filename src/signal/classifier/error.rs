use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned status {status}")]
    Status { source_name: String, status: u16 },

    #[error("malformed response from {source_name}: {reason}")]
    MalformedResponse { source_name: String, reason: String },

    #[error("model {model} is still loading")]
    ModelLoading { model: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{source_name} timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("classifier task failed: {reason}")]
    TaskFailed { reason: String },
}

impl ClassifierError {
    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        ClassifierError::MalformedResponse {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
