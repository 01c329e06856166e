use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use super::error::EnsembleConfigError;
use super::types::{Classification, LengthBucket};
use crate::constants::{
    DEFAULT_PRODUCER_TIMEOUT_MS, DEFAULT_VARIANCE_CAP, FAILURE_CONFIDENCE, SHORT_INPUT_CONFIDENCE,
    TextLimits,
};
use crate::signal::SignalKind;

/// One weight per signal kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector {
    pub pattern: f64,
    pub statistical: f64,
    pub classifier: f64,
}

impl WeightVector {
    pub const ZERO: WeightVector = WeightVector::new(0.0, 0.0, 0.0);

    pub const fn new(pattern: f64, statistical: f64, classifier: f64) -> Self {
        Self {
            pattern,
            statistical,
            classifier,
        }
    }

    pub fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Pattern => self.pattern,
            SignalKind::Statistical => self.statistical,
            SignalKind::Classifier => self.classifier,
        }
    }

    pub fn set(&mut self, kind: SignalKind, weight: f64) {
        match kind {
            SignalKind::Pattern => self.pattern = weight,
            SignalKind::Statistical => self.statistical = weight,
            SignalKind::Classifier => self.classifier = weight,
        }
    }

    pub fn sum(&self) -> f64 {
        self.pattern + self.statistical + self.classifier
    }

    fn validate(&self, bucket: &'static str) -> Result<(), EnsembleConfigError> {
        for kind in SignalKind::ALL {
            let w = self.get(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(EnsembleConfigError::InvalidWeights {
                    bucket,
                    reason: format!("{kind} weight must be a non-negative number, got {w}"),
                });
            }
        }
        if self.sum() <= 0.0 {
            return Err(EnsembleConfigError::InvalidWeights {
                bucket,
                reason: "weights sum to zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Weights for one length bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketWeights {
    pub primary: WeightVector,
    /// Used when the classifier is down but both heuristics answered.
    pub classifier_down: WeightVector,
}

impl BucketWeights {
    pub const fn new(primary: WeightVector, fallback_pattern: f64, fallback_statistical: f64) -> Self {
        Self {
            primary,
            classifier_down: WeightVector::new(fallback_pattern, fallback_statistical, 0.0),
        }
    }

    fn validate(&self, bucket: &'static str) -> Result<(), EnsembleConfigError> {
        self.primary.validate(bucket)?;
        self.classifier_down.validate(bucket)?;
        if self.classifier_down.classifier != 0.0 {
            return Err(EnsembleConfigError::InvalidWeights {
                bucket,
                reason: "classifier-down fallback cannot weight the classifier".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
    pub short: BucketWeights,
    pub medium: BucketWeights,
    pub long: BucketWeights,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            // Short texts give statistics little to work with.
            short: BucketWeights::new(WeightVector::new(0.45, 0.15, 0.40), 0.65, 0.35),
            medium: BucketWeights::new(WeightVector::new(0.40, 0.30, 0.30), 0.55, 0.45),
            long: BucketWeights::new(WeightVector::new(0.30, 0.45, 0.25), 0.45, 0.55),
        }
    }
}

impl WeightTable {
    /// The same weights for every bucket.
    pub fn uniform(weights: BucketWeights) -> Self {
        Self {
            short: weights,
            medium: weights,
            long: weights,
        }
    }

    pub fn get(&self, bucket: LengthBucket) -> &BucketWeights {
        match bucket {
            LengthBucket::Short => &self.short,
            LengthBucket::Medium => &self.medium,
            LengthBucket::Long => &self.long,
        }
    }

    pub fn validate(&self) -> Result<(), EnsembleConfigError> {
        self.short.validate("short")?;
        self.medium.validate("medium")?;
        self.long.validate("long")
    }
}

/// Cut points, evaluated top-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub ai: f64,
    pub likely_ai: f64,
    pub mixed: f64,
    pub likely_human: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ai: 0.85,
            likely_ai: 0.65,
            mixed: 0.45,
            likely_human: 0.25,
        }
    }
}

impl Thresholds {
    pub fn classify(&self, probability: f64) -> Classification {
        if probability >= self.ai {
            Classification::Ai
        } else if probability >= self.likely_ai {
            Classification::LikelyAi
        } else if probability >= self.mixed {
            Classification::Mixed
        } else if probability >= self.likely_human {
            Classification::LikelyHuman
        } else {
            Classification::Human
        }
    }

    pub fn validate(&self) -> Result<(), EnsembleConfigError> {
        let cuts = [self.ai, self.likely_ai, self.mixed, self.likely_human];
        if cuts.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(EnsembleConfigError::InvalidThresholds {
                reason: format!("every cut point must be within [0, 1], got {cuts:?}"),
            });
        }
        if cuts.windows(2).any(|w| w[0] <= w[1]) {
            return Err(EnsembleConfigError::InvalidThresholds {
                reason: format!("cut points must be strictly descending, got {cuts:?}"),
            });
        }
        Ok(())
    }
}

impl FromStr for Thresholds {
    type Err = EnsembleConfigError;

    /// Parses `"ai,likely_ai,mixed,likely_human"`, e.g. `"0.85,0.65,0.45,0.25"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EnsembleConfigError::InvalidThresholds {
                reason: format!("failed to parse {s:?}: {e}"),
            })?;

        let &[ai, likely_ai, mixed, likely_human] = values.as_slice() else {
            return Err(EnsembleConfigError::InvalidThresholds {
                reason: format!("expected 4 comma-separated values, got {}", values.len()),
            });
        };

        let thresholds = Self {
            ai,
            likely_ai,
            mixed,
            likely_human,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// Starting confidence, chosen by which signals answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseConfidence {
    pub all_available: f64,
    /// Classifier answered but at least one heuristic did not.
    pub classifier_partial: f64,
    /// Only heuristic signals answered.
    pub heuristic_only: f64,
}

impl Default for BaseConfidence {
    fn default() -> Self {
        Self {
            all_available: 0.85,
            classifier_partial: 0.75,
            heuristic_only: 0.60,
        }
    }
}

impl BaseConfidence {
    fn validate(&self) -> Result<(), EnsembleConfigError> {
        for (name, value) in [
            ("all_available confidence", self.all_available),
            ("classifier_partial confidence", self.classifier_partial),
            ("heuristic_only confidence", self.heuristic_only),
        ] {
            check_unit(name, value)?;
        }
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), EnsembleConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EnsembleConfigError::InvalidConfidence { name, value })
    }
}

/// Multiplicative correction per platform tag (matched case-insensitively).
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformAdjustments {
    factors: HashMap<String, f64>,
}

impl Default for PlatformAdjustments {
    fn default() -> Self {
        Self::none().with("twitter", 1.10).with("x", 1.10)
    }
}

impl PlatformAdjustments {
    pub fn none() -> Self {
        Self {
            factors: HashMap::new(),
        }
    }

    pub fn with(mut self, platform: &str, factor: f64) -> Self {
        self.factors
            .insert(platform.trim().to_lowercase(), factor);
        self
    }

    /// `1.0` for unknown or missing platforms.
    pub fn factor(&self, platform: Option<&str>) -> f64 {
        platform
            .and_then(|p| self.factors.get(&p.trim().to_lowercase()))
            .copied()
            .unwrap_or(1.0)
    }

    fn validate(&self) -> Result<(), EnsembleConfigError> {
        for (platform, factor) in &self.factors {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(EnsembleConfigError::InvalidPlatformFactor {
                    platform: platform.clone(),
                    value: *factor,
                });
            }
        }
        Ok(())
    }
}

/// Everything the combiner needs besides its producers.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub limits: TextLimits,
    pub weights: WeightTable,
    pub thresholds: Thresholds,
    pub base_confidence: BaseConfidence,
    pub variance_cap: f64,
    pub producer_timeout: Duration,
    pub failure_confidence: f64,
    pub short_input_confidence: f64,
    pub platforms: PlatformAdjustments,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            limits: TextLimits::default(),
            weights: WeightTable::default(),
            thresholds: Thresholds::default(),
            base_confidence: BaseConfidence::default(),
            variance_cap: DEFAULT_VARIANCE_CAP,
            producer_timeout: Duration::from_millis(DEFAULT_PRODUCER_TIMEOUT_MS),
            failure_confidence: FAILURE_CONFIDENCE,
            short_input_confidence: SHORT_INPUT_CONFIDENCE,
            platforms: PlatformAdjustments::default(),
        }
    }
}

impl EnsembleConfig {
    pub fn with_limits(mut self, limits: TextLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_base_confidence(mut self, base: BaseConfidence) -> Self {
        self.base_confidence = base;
        self
    }

    pub fn with_variance_cap(mut self, cap: f64) -> Self {
        self.variance_cap = cap;
        self
    }

    pub fn with_producer_timeout(mut self, timeout: Duration) -> Self {
        self.producer_timeout = timeout;
        self
    }

    pub fn with_failure_confidence(mut self, confidence: f64) -> Self {
        self.failure_confidence = confidence;
        self
    }

    pub fn with_platforms(mut self, platforms: PlatformAdjustments) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn validate(&self) -> Result<(), EnsembleConfigError> {
        self.limits.validate()?;
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.base_confidence.validate()?;
        self.platforms.validate()?;
        check_unit("failure_confidence", self.failure_confidence)?;
        check_unit("short_input_confidence", self.short_input_confidence)?;

        if !self.variance_cap.is_finite() || self.variance_cap <= 0.0 {
            return Err(EnsembleConfigError::InvalidVarianceCap {
                value: self.variance_cap,
            });
        }
        if self.producer_timeout.is_zero() {
            return Err(EnsembleConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
