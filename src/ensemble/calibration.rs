use super::config::BaseConfidence;
use super::weights::Availability;
use crate::constants::SINGLE_SIGNAL_DISCOUNT;

pub fn base_confidence(base: &BaseConfidence, available: Availability) -> f64 {
    if available.all() {
        base.all_available
    } else if available.classifier {
        base.classifier_partial
    } else {
        base.heuristic_only
    }
}

/// Mean squared deviation of the signal scores from the combined probability.
pub fn variance_around(scores: &[f64], combined: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|s| (s - combined).powi(2)).sum::<f64>() / scores.len() as f64
}

/// `1` when signals agree exactly, `0` once variance reaches `cap`.
pub fn agreement(variance: f64, cap: f64) -> f64 {
    1.0 - variance.min(cap) / cap
}

/// Scales `base` by inter-signal agreement. Fewer than two scores are discounted
/// instead, since there is nothing to agree with.
pub fn calibrate(scores: &[f64], combined: f64, base: f64, cap: f64) -> f64 {
    let confidence = if scores.len() < 2 {
        base * SINGLE_SIGNAL_DISCOUNT
    } else {
        base * (0.7 + 0.3 * agreement(variance_around(scores, combined), cap))
    };
    confidence.clamp(0.0, 1.0)
}
