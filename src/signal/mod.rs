//! Signal producers: independent scorers the ensemble fans a text out to.
//!
//! A producer never fails past its boundary. Anything that goes wrong inside it becomes
//! an unavailable [`SignalResult`] with a neutral score, and the combiner reweights.

pub mod classifier;
pub mod error;
pub mod guard;
pub mod pattern;
pub mod statistical;
pub mod types;


pub use classifier::{
    ClassifierBackend, ClassifierChain, ClassifierConfig, ClassifierError, LocalClassifier,
    RemoteClassifier, RemoteKind,
};
#[cfg(any(test, feature = "mock"))]
pub use classifier::MockClassifierBackend;
pub use error::SignalError;
pub use guard::bounded;
pub use pattern::{PATTERN_MIN_WORDS, PatternAnalysis, PatternScorer};
pub use statistical::{STATISTICAL_MIN_WORDS, StatisticalMetrics, StatisticalScorer};
pub use types::{SignalKind, SignalResult};

use std::sync::Arc;

use async_trait::async_trait;

#[async_trait]
/// Contract shared by every signal producer.
pub trait SignalProducer: Send + Sync {
    fn kind(&self) -> SignalKind;
    /// Inputs with fewer words are rejected as unavailable.
    fn min_words(&self) -> usize;
    /// Scores `text`. Infallible: failures surface as `available = false`.
    async fn produce(&self, text: &str) -> SignalResult;
}

/// The shipped producer set: pattern, statistical, and the given classifier chain.
pub fn standard_producers(
    classifier: ClassifierChain,
) -> Result<Vec<Arc<dyn SignalProducer>>, regex::Error> {
    Ok(vec![
        Arc::new(PatternScorer::new()?),
        Arc::new(StatisticalScorer::new()),
        Arc::new(classifier),
    ])
}

/// Producer with a fixed answer, for tests.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone)]
pub struct MockSignalProducer {
    kind: SignalKind,
    score: Option<f64>,
    delay: std::time::Duration,
    panics: bool,
}

#[cfg(any(test, feature = "mock"))]
impl MockSignalProducer {
    pub fn scoring(kind: SignalKind, score: f64) -> Self {
        Self {
            kind,
            score: Some(score),
            delay: std::time::Duration::ZERO,
            panics: false,
        }
    }

    pub fn unavailable(kind: SignalKind) -> Self {
        Self {
            kind,
            score: None,
            delay: std::time::Duration::ZERO,
            panics: false,
        }
    }

    pub fn panicking(kind: SignalKind) -> Self {
        Self {
            panics: true,
            ..Self::unavailable(kind)
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl SignalProducer for MockSignalProducer {
    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn min_words(&self) -> usize {
        1
    }

    async fn produce(&self, _text: &str) -> SignalResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics {
            panic!("mock producer panicked");
        }
        match self.score {
            Some(score) => SignalResult::scored(self.kind, score, Default::default()),
            None => SignalResult::unavailable(self.kind, "mock unavailable"),
        }
    }
}
