use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::calibration::{base_confidence, calibrate};
use super::config::EnsembleConfig;
use super::error::EnsembleConfigError;
use super::types::{EnsembleResult, LengthBucket};
use super::weights::{Availability, select_weights};
use crate::constants::word_count;
use crate::signal::guard::elapsed_ms;
use crate::signal::{SignalError, SignalKind, SignalProducer, SignalResult, bounded};

/// Fans a text out to every producer and recombines their scores.
pub struct EnsembleCombiner {
    config: EnsembleConfig,
    producers: Vec<Arc<dyn SignalProducer>>,
}

impl std::fmt::Debug for EnsembleCombiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleCombiner")
            .field("config", &self.config)
            .field("producers", &self.kinds())
            .finish()
    }
}

impl EnsembleCombiner {
    pub fn new(
        config: EnsembleConfig,
        producers: Vec<Arc<dyn SignalProducer>>,
    ) -> Result<Self, EnsembleConfigError> {
        config.validate()?;

        let mut seen = HashSet::new();
        for producer in &producers {
            if !seen.insert(producer.kind()) {
                return Err(EnsembleConfigError::DuplicateProducer {
                    kind: producer.kind(),
                });
            }
        }

        Ok(Self { config, producers })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn kinds(&self) -> Vec<SignalKind> {
        self.producers.iter().map(|p| p.kind()).collect()
    }

    pub fn has_producer(&self, kind: SignalKind) -> bool {
        self.producers.iter().any(|p| p.kind() == kind)
    }

    /// Scores `text`. Never fails: degraded inputs produce an `UNCERTAIN` verdict.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn detect(&self, text: &str, platform: Option<&str>) -> EnsembleResult {
        let start = Instant::now();
        let platform = platform
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty());

        if !self.config.limits.accepts(text) {
            debug!(
                words = word_count(text),
                min_words = self.config.limits.min_words,
                "Input below scoring minimum"
            );
            let mut result = EnsembleResult::degenerate(
                self.config.short_input_confidence,
                word_count(text),
                format!(
                    "text needs at least {} characters and {} words",
                    self.config.limits.min_chars, self.config.limits.min_words
                ),
            );
            result.platform = platform;
            result.inference_time_ms = elapsed_ms(start);
            return result;
        }

        let text: Arc<str> = Arc::from(self.config.limits.truncate(text));
        let signals = self.fan_out(&text).await;

        let mut result = combine(&self.config, signals, word_count(&text), platform);
        result.inference_time_ms = elapsed_ms(start);

        info!(
            classification = %result.classification,
            ai_probability = result.ai_probability,
            confidence = result.confidence,
            signals = result.available_signals(),
            "Ensemble verdict"
        );

        result
    }

    async fn fan_out(&self, text: &Arc<str>) -> Vec<SignalResult> {
        let timeout = self.config.producer_timeout;

        let handles: Vec<_> = self
            .producers
            .iter()
            .map(|producer| {
                let producer = Arc::clone(producer);
                let text = Arc::clone(text);
                let kind = producer.kind();
                (
                    kind,
                    tokio::spawn(async move {
                        bounded(kind, timeout, producer.produce(&text)).await
                    }),
                )
            })
            .collect();

        let (kinds, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();

        join_all(tasks)
            .await
            .into_iter()
            .zip(kinds)
            .map(|(joined, kind)| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(signal = %kind, error = %e, "Signal producer task failed");
                    SignalError::TaskFailed {
                        kind,
                        reason: e.to_string(),
                    }
                    .into_result(kind)
                }
            })
            .collect()
    }
}

/// Recombines producer outputs into a verdict. Order of `signals` does not matter.
pub fn combine(
    config: &EnsembleConfig,
    signals: Vec<SignalResult>,
    word_count: usize,
    platform: Option<String>,
) -> EnsembleResult {
    let bucket = LengthBucket::for_word_count(word_count);
    let available = Availability::from_kinds(
        signals
            .iter()
            .filter(|s| s.available)
            .map(|s| s.kind),
    );

    let mut per_signal_scores: BTreeMap<SignalKind, Option<f64>> =
        SignalKind::ALL.iter().map(|k| (*k, None)).collect();
    let mut details = BTreeMap::new();
    for signal in signals.iter() {
        per_signal_scores.insert(signal.kind, signal.available_score());
        let mut detail = signal.detail.clone();
        detail.insert("latency_ms".to_string(), json!(signal.latency_ms));
        details.insert(signal.kind, detail);
    }

    if available.is_empty() {
        warn!(
            producers = signals.len(),
            "No signal producer available, returning degenerate verdict"
        );
        let mut result = EnsembleResult::degenerate(
            config.failure_confidence,
            word_count,
            "no signal producer was available",
        );
        result.length_bucket = Some(bucket);
        result.platform = platform;
        result.details = details;
        return result;
    }

    let weights = select_weights(config.weights.get(bucket), available);

    let scores: Vec<(SignalKind, f64)> = signals
        .iter()
        .filter_map(|s| s.available_score().map(|score| (s.kind, score)))
        .collect();

    let combined: f64 = scores
        .iter()
        .map(|(kind, score)| weights.get(*kind) * score)
        .sum();

    let factor = config.platforms.factor(platform.as_deref());
    let ai_probability = (combined * factor).clamp(0.0, 1.0);

    let raw_scores: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();
    let base = base_confidence(&config.base_confidence, available);
    let confidence = calibrate(&raw_scores, ai_probability, base, config.variance_cap);

    let classification = config.thresholds.classify(ai_probability);

    debug!(
        bucket = bucket.as_str(),
        ?weights,
        combined,
        factor,
        "Signals combined"
    );

    EnsembleResult {
        ai_probability,
        classification,
        confidence,
        per_signal_scores,
        weights_used: SignalKind::ALL
            .iter()
            .map(|k| (*k, weights.get(*k)))
            .collect(),
        inference_time_ms: 0.0,
        word_count,
        length_bucket: Some(bucket),
        platform,
        details,
        note: None,
    }
}
