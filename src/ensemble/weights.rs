use super::config::{BucketWeights, WeightVector};
use crate::signal::SignalKind;

/// Which signal kinds answered for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    pub pattern: bool,
    pub statistical: bool,
    pub classifier: bool,
}

impl Availability {
    pub fn from_kinds(kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        let mut availability = Self::default();
        for kind in kinds {
            availability.set(kind);
        }
        availability
    }

    pub fn set(&mut self, kind: SignalKind) {
        match kind {
            SignalKind::Pattern => self.pattern = true,
            SignalKind::Statistical => self.statistical = true,
            SignalKind::Classifier => self.classifier = true,
        }
    }

    pub fn contains(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::Pattern => self.pattern,
            SignalKind::Statistical => self.statistical,
            SignalKind::Classifier => self.classifier,
        }
    }

    pub fn count(&self) -> usize {
        SignalKind::ALL.iter().filter(|k| self.contains(**k)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn all(&self) -> bool {
        self.count() == SignalKind::ALL.len()
    }
}

/// Picks the weights for the signals that answered.
///
/// Classifier down with both heuristics up uses the bucket's fixed fallback. Any other
/// subset redistributes the primary weights proportionally over what answered, or
/// equally if those weights are all zero. Unavailable signals always get `0`.
pub fn select_weights(bucket: &BucketWeights, available: Availability) -> WeightVector {
    if available.is_empty() {
        return WeightVector::ZERO;
    }

    if !available.classifier && available.pattern && available.statistical {
        return normalized(bucket.classifier_down, available);
    }

    normalized(bucket.primary, available)
}

fn normalized(weights: WeightVector, available: Availability) -> WeightVector {
    let mut masked = WeightVector::ZERO;
    for kind in SignalKind::ALL {
        if available.contains(kind) {
            masked.set(kind, weights.get(kind));
        }
    }

    let total = masked.sum();
    let mut out = WeightVector::ZERO;

    if total > 0.0 {
        for kind in SignalKind::ALL {
            out.set(kind, masked.get(kind) / total);
        }
    } else {
        let share = 1.0 / available.count() as f64;
        for kind in SignalKind::ALL {
            if available.contains(kind) {
                out.set(kind, share);
            }
        }
    }

    out
}
