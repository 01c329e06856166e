//! Local sequence-classification model (BERT/RoBERTa detector checkpoints) on candle.

pub mod bert;
pub mod device;
pub mod error;
pub mod tokenizer;


pub use bert::{LabelLayout, SequenceClassifier};
pub use device::{Accelerator, select_device};
pub use error::ModelError;

use candle_core::Tensor;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use tokenizer::load_tokenizer;

/// Position-embedding limit of the supported checkpoints.
pub const MAX_SEQ_LEN: usize = 512;

/// Files a model directory must contain.
pub const REQUIRED_MODEL_FILES: &[&str] = &["config.json", "model.safetensors", "tokenizer.json"];

/// Returns the first required file missing from `model_dir`.
pub fn missing_model_file(model_dir: &Path) -> Option<PathBuf> {
    REQUIRED_MODEL_FILES
        .iter()
        .map(|name| model_dir.join(name))
        .find(|path| !path.exists())
}

pub struct LocalModel {
    device: candle_core::Device,
    model_path: PathBuf,
    model: SequenceClassifier,
    tokenizer: Tokenizer,
}

impl std::fmt::Debug for LocalModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalModel")
            .field("device", &format!("{:?}", self.device))
            .field("model_path", &self.model_path)
            .field("labels", &self.model.labels())
            .finish()
    }
}

impl LocalModel {
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        if !model_path.is_dir() {
            return Err(ModelError::DirectoryNotFound {
                path: model_path.to_path_buf(),
            });
        }

        if let Some(missing) = missing_model_file(model_path) {
            return Err(ModelError::MissingFile { file: missing });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for classifier");

        info!(model_path = %model_path.display(), "Loading local classifier model");

        let model =
            SequenceClassifier::load(model_path, &device).map_err(|e| ModelError::Load {
                component: "weights",
                reason: e.to_string(),
            })?;

        let tokenizer = load_tokenizer(model_path, MAX_SEQ_LEN)?;

        info!(labels = ?model.labels(), "Local classifier model loaded");

        Ok(Self {
            device,
            model_path: model_path.to_path_buf(),
            model,
            tokenizer,
        })
    }

    /// Probability that `text` is machine-generated. Blocking; call from a blocking thread.
    pub fn ai_probability(&self, text: &str) -> Result<f64, ModelError> {
        let tokens =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| ModelError::Tokenize {
                    reason: e.to_string(),
                })?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = self
            .model
            .forward(&token_ids, &type_ids, Some(&attention_mask))?
            .flatten_all()?
            .to_vec1::<f32>()?;

        let probability =
            self.model
                .labels()
                .ai_probability(&logits)
                .ok_or_else(|| ModelError::LogitShape {
                    len: logits.len(),
                    labels: self.model.labels().num_labels,
                })?;

        debug!(
            tokens = tokens.get_ids().len(),
            probability, "Local classifier scored text"
        );

        Ok(probability)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }
}
