use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::ClassifierBackend;
use super::error::{ClassifierError, ClassifierResult};
use crate::model::{LocalModel, ModelError};

/// Last link of the chain: an on-disk sequence classifier.
///
/// Weights are shared read-only; inference runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct LocalClassifier {
    model: Arc<LocalModel>,
}

impl LocalClassifier {
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        Ok(Self::from_model(LocalModel::load(model_path)?))
    }

    pub fn from_model(model: LocalModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn model(&self) -> &LocalModel {
        &self.model
    }
}

#[async_trait]
impl ClassifierBackend for LocalClassifier {
    fn source(&self) -> String {
        "local_model".to_string()
    }

    async fn classify(&self, text: &str) -> ClassifierResult<f64> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || model.ai_probability(&text))
            .await
            .map_err(|e| ClassifierError::TaskFailed {
                reason: e.to_string(),
            })?
            .map_err(ClassifierError::from)
    }
}
