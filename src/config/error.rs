//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::ensemble::EnsembleConfigError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric or boolean variable held something unparseable.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Model directory lacks one of `config.json`, `model.safetensors`, `tokenizer.json`.
    #[error("model directory is missing {path}")]
    MissingModelFile { path: PathBuf },

    /// A hung classifier link would consume the producer budget meant for its fallbacks.
    #[error(
        "classifier link timeout {link_ms}ms must be non-zero and fit twice within the producer timeout {producer_ms}ms"
    )]
    LinkTimeoutBudget { link_ms: u64, producer_ms: u64 },

    /// Scoring parameters are inconsistent.
    #[error(transparent)]
    Ensemble(#[from] EnsembleConfigError),
}
