use std::path::PathBuf;
use thiserror::Error;

/// Failures loading or running the local classifier checkpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("classifier model directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("classifier model is missing {file}")]
    MissingFile { file: PathBuf },

    #[error("failed to load classifier {component}: {reason}")]
    Load {
        component: &'static str,
        reason: String,
    },

    #[error("tokenization failed: {reason}")]
    Tokenize { reason: String },

    #[error("classifier produced {len} logits for a {labels}-label head")]
    LogitShape { len: usize, labels: usize },

    #[error("classifier inference failed: {0}")]
    Inference(#[from] candle_core::Error),
}
