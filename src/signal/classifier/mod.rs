//! Learned-classifier producer: a priority chain of backends, first success wins.

pub mod config;
pub mod error;
pub mod local;
pub mod remote;

#[cfg(test)]
mod tests;

pub use config::ClassifierConfig;
pub use error::{ClassifierError, ClassifierResult};
pub use local::LocalClassifier;
pub use remote::{RemoteClassifier, RemoteKind};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::SignalProducer;
use super::error::SignalError;
use super::guard::elapsed_ms;
use super::types::{SignalKind, SignalResult};
use crate::constants::{DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS, word_count};

pub const DEFAULT_CLASSIFIER_MIN_WORDS: usize = 5;

#[async_trait]
/// One strategy in the classifier chain.
pub trait ClassifierBackend: Send + Sync {
    /// Stable name recorded as `source` in the signal detail.
    fn source(&self) -> String;
    /// Probability that `text` is machine-generated.
    async fn classify(&self, text: &str) -> ClassifierResult<f64>;
}

pub struct ClassifierChain {
    links: Vec<Arc<dyn ClassifierBackend>>,
    link_timeout: Duration,
    min_words: usize,
}

impl std::fmt::Debug for ClassifierChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierChain")
            .field("links", &self.sources())
            .field("link_timeout", &self.link_timeout)
            .field("min_words", &self.min_words)
            .finish()
    }
}

impl ClassifierChain {
    pub fn new(links: Vec<Arc<dyn ClassifierBackend>>) -> Self {
        Self {
            links,
            link_timeout: Duration::from_millis(DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS),
            min_words: DEFAULT_CLASSIFIER_MIN_WORDS,
        }
    }

    pub fn with_link_timeout(mut self, timeout: Duration) -> Self {
        self.link_timeout = timeout;
        self
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words.max(1);
        self
    }

    pub fn sources(&self) -> Vec<String> {
        self.links.iter().map(|l| l.source()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    async fn try_link(&self, link: &dyn ClassifierBackend, text: &str) -> ClassifierResult<f64> {
        match tokio::time::timeout(self.link_timeout, link.classify(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout {
                source_name: link.source(),
                timeout_ms: self.link_timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl SignalProducer for ClassifierChain {
    fn kind(&self) -> SignalKind {
        SignalKind::Classifier
    }

    fn min_words(&self) -> usize {
        self.min_words
    }

    async fn produce(&self, text: &str) -> SignalResult {
        let words = word_count(text);
        if words < self.min_words {
            return SignalError::InputTooShort {
                words,
                min: self.min_words,
            }
            .into_result(SignalKind::Classifier);
        }

        if self.links.is_empty() {
            return SignalResult::unavailable(
                SignalKind::Classifier,
                "no classifier backends configured",
            );
        }

        let mut failures: Vec<Value> = Vec::new();

        for link in &self.links {
            let source = link.source();
            let start = Instant::now();

            match self.try_link(link.as_ref(), text).await {
                Ok(probability) if probability.is_finite() => {
                    debug!(source = %source, probability, "Classifier backend succeeded");
                    let mut detail = Map::new();
                    detail.insert("source".to_string(), Value::String(source));
                    detail.insert("backend_latency_ms".to_string(), json!(elapsed_ms(start)));
                    if !failures.is_empty() {
                        detail.insert("failures".to_string(), Value::Array(failures));
                    }
                    return SignalResult::scored(SignalKind::Classifier, probability, detail);
                }
                Ok(probability) => {
                    failures.push(json!({
                        "source": source,
                        "error": format!("non-finite probability {probability}"),
                    }));
                }
                Err(e) => {
                    debug!(source = %source, error = %e, "Classifier backend failed");
                    failures.push(json!({ "source": source, "error": e.to_string() }));
                }
            }
        }

        warn!(attempts = failures.len(), "Every classifier backend failed");
        SignalError::Exhausted {
            kind: SignalKind::Classifier,
        }
        .into_result(SignalKind::Classifier)
        .with_detail("failures", Value::Array(failures))
    }
}

/// Scripted backend for tests.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone)]
pub struct MockClassifierBackend {
    source: String,
    outcome: Result<f64, String>,
    delay: Duration,
    calls: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "mock"))]
impl MockClassifierBackend {
    pub fn returning(source: &str, probability: f64) -> Self {
        Self {
            source: source.to_string(),
            outcome: Ok(probability),
            delay: Duration::ZERO,
            calls: Arc::default(),
        }
    }

    pub fn failing(source: &str, reason: &str) -> Self {
        Self {
            source: source.to_string(),
            outcome: Err(reason.to_string()),
            delay: Duration::ZERO,
            calls: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl ClassifierBackend for MockClassifierBackend {
    fn source(&self) -> String {
        self.source.clone()
    }

    async fn classify(&self, _text: &str) -> ClassifierResult<f64> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
            .clone()
            .map_err(|reason| ClassifierError::malformed(&self.source, reason))
    }
}
