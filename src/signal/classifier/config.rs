use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::local::LocalClassifier;
use super::remote::{DEFAULT_HF_MODELS, RemoteClassifier, RemoteKind};
use super::{ClassifierBackend, ClassifierChain, DEFAULT_CLASSIFIER_MIN_WORDS};
use crate::constants::DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS;

/// Which classifier backends to assemble, in chain order.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub zerogpt_api_key: Option<String>,
    pub gptzero_api_key: Option<String>,
    pub model_server_url: Option<String>,
    pub hf_inference: bool,
    pub hf_models: Vec<String>,
    pub model_path: Option<PathBuf>,
    /// Budget for a single backend call.
    pub link_timeout: Duration,
    pub min_words: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            zerogpt_api_key: None,
            gptzero_api_key: None,
            model_server_url: None,
            hf_inference: false,
            hf_models: DEFAULT_HF_MODELS.iter().map(|m| m.to_string()).collect(),
            model_path: None,
            link_timeout: Duration::from_millis(DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS),
            min_words: DEFAULT_CLASSIFIER_MIN_WORDS,
        }
    }
}

impl ClassifierConfig {
    /// Returns `true` if at least one backend would be assembled.
    pub fn has_backends(&self) -> bool {
        self.zerogpt_api_key.is_some()
            || self.gptzero_api_key.is_some()
            || self.model_server_url.is_some()
            || (self.hf_inference && !self.hf_models.is_empty())
            || self.model_path.is_some()
    }

    /// Builds the remote links in priority order.
    pub fn remote_kinds(&self) -> Vec<RemoteKind> {
        let mut kinds = Vec::new();
        if let Some(key) = &self.zerogpt_api_key {
            kinds.push(RemoteKind::zerogpt(key.clone()));
        }
        if let Some(key) = &self.gptzero_api_key {
            kinds.push(RemoteKind::gptzero(key.clone()));
        }
        if let Some(url) = &self.model_server_url {
            kinds.push(RemoteKind::model_server(url.clone()));
        }
        if self.hf_inference {
            kinds.extend(self.hf_models.iter().map(RemoteKind::hugging_face));
        }
        kinds
    }

    /// Assembles the chain. A link that cannot be constructed is logged and skipped.
    pub fn build_chain(&self) -> ClassifierChain {
        let mut links: Vec<Arc<dyn ClassifierBackend>> = self
            .remote_kinds()
            .into_iter()
            .filter_map(|kind| {
                let source = kind.source();
                usable_link(&source, RemoteClassifier::new(kind, self.link_timeout))
            })
            .collect();

        if let Some(path) = &self.model_path {
            links.extend(usable_link("local", LocalClassifier::load(path)));
        }

        info!(
            links = ?links.iter().map(|l| l.source()).collect::<Vec<_>>(),
            "Classifier chain assembled"
        );

        ClassifierChain::new(links)
            .with_link_timeout(self.link_timeout)
            .with_min_words(self.min_words)
    }
}

/// Keeps a constructed link, or logs why it is left out of the chain.
pub(crate) fn usable_link<B, E>(source: &str, built: Result<B, E>) -> Option<Arc<dyn ClassifierBackend>>
where
    B: ClassifierBackend + 'static,
    E: std::fmt::Display,
{
    match built {
        Ok(link) => Some(Arc::new(link)),
        Err(e) => {
            warn!(source, error = %e, "Classifier backend unavailable, continuing without it");
            None
        }
    }
}
