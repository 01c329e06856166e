//! Verifily library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Detection
//! - [`SignalProducer`] - one independent opinion about a text
//! - [`PatternScorer`], [`StatisticalScorer`], [`ClassifierChain`] - the three producers
//! - [`EnsembleCombiner`], [`EnsembleResult`] - bounded fan-out and weighted combination
//!
//! ## Verification Cache
//! - [`VerificationCache`] - one shared verdict per normalized text
//! - [`VerificationStore`], [`MemoryStore`], [`NvmeStore`] - record backends
//! - [`content_hash`], [`normalize_text`] - content addressing
//!
//! ## Configuration
//! - [`Config`], [`ConfigError`] - `VERIFILY_*` environment configuration
//! - [`EnsembleConfig`], [`ClassifierConfig`] - scoring and backend parameters
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod ensemble;
pub mod hashing;
pub mod model;
pub mod signal;
pub mod verification;

pub use config::{Config, ConfigError};
pub use constants::{TextLimits, TextLimitsError, word_count};
pub use ensemble::{
    Classification, EnsembleCombiner, EnsembleConfig, EnsembleConfigError, EnsembleResult,
    LengthBucket, Thresholds, WeightTable,
};
pub use hashing::{content_hash, is_content_hash, normalize_text};
pub use model::{LocalModel, ModelError};
#[cfg(any(test, feature = "mock"))]
pub use signal::{MockClassifierBackend, MockSignalProducer};
pub use signal::{
    ClassifierBackend, ClassifierChain, ClassifierConfig, ClassifierError, PatternScorer,
    SignalError, SignalKind, SignalProducer, SignalResult, StatisticalScorer, standard_producers,
};
#[cfg(any(test, feature = "mock"))]
pub use verification::UnreachableStore;
pub use verification::{
    InsertOutcome, MemoryStore, NvmeStore, PostRef, StoreError, VERIFILY_STATUS_HEADER,
    VerifilyStatus, VerificationCache, VerificationError, VerificationRecord, VerificationStats,
    VerificationStore, VerificationType, VerifyOutcome,
};
