use thiserror::Error;

use crate::constants::TextLimitsError;
use crate::signal::SignalKind;

#[derive(Debug, Error)]
pub enum EnsembleConfigError {
    #[error("invalid {bucket} weights: {reason}")]
    InvalidWeights { bucket: &'static str, reason: String },

    #[error("invalid thresholds: {reason}")]
    InvalidThresholds { reason: String },

    #[error("variance cap must be a positive number, got {value}")]
    InvalidVarianceCap { value: f64 },

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidConfidence { name: &'static str, value: f64 },

    #[error("platform factor for {platform} must be a positive number, got {value}")]
    InvalidPlatformFactor { platform: String, value: f64 },

    #[error("producer timeout must be non-zero")]
    ZeroTimeout,

    #[error("more than one {kind} producer registered")]
    DuplicateProducer { kind: SignalKind },

    #[error("invalid text limits: {0}")]
    TextLimits(#[from] TextLimitsError),
}
