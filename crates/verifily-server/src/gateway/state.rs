use std::sync::Arc;

use verifily::ensemble::EnsembleCombiner;
use verifily::verification::{VerificationCache, VerificationStore};

pub struct HandlerState<S: VerificationStore + 'static> {
    pub combiner: Arc<EnsembleCombiner>,

    pub cache: Arc<VerificationCache<S>>,

    /// Classifier backends in chain order (empty means heuristics only).
    pub classifier_sources: Arc<[String]>,
}

impl<S: VerificationStore + 'static> Clone for HandlerState<S> {
    fn clone(&self) -> Self {
        Self {
            combiner: Arc::clone(&self.combiner),
            cache: Arc::clone(&self.cache),
            classifier_sources: Arc::clone(&self.classifier_sources),
        }
    }
}

impl<S: VerificationStore + 'static> HandlerState<S> {
    pub fn new(combiner: EnsembleCombiner, store: S, classifier_sources: Vec<String>) -> Self {
        Self {
            combiner: Arc::new(combiner),
            cache: Arc::new(VerificationCache::new(store)),
            classifier_sources: classifier_sources.into(),
        }
    }

    pub fn classifier_mode(&self) -> &'static str {
        if self.classifier_sources.is_empty() {
            "heuristic_only"
        } else {
            "ensemble"
        }
    }
}
