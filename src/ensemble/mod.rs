//! Ensemble scoring: adaptive weighting, confidence calibration and classification.

pub mod calibration;
pub mod combiner;
pub mod config;
pub mod error;
pub mod types;
pub mod weights;


pub use combiner::{EnsembleCombiner, combine};
pub use config::{
    BaseConfidence, BucketWeights, EnsembleConfig, PlatformAdjustments, Thresholds, WeightTable,
    WeightVector,
};
pub use error::EnsembleConfigError;
pub use types::{Classification, EnsembleResult, LengthBucket};
pub use weights::{Availability, select_weights};
