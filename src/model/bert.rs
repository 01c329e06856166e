use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;

/// Label names that mark the machine-generated class in `id2label`.
const AI_LABEL_NAMES: &[&str] = &["fake", "ai", "generated", "machine", "chatgpt", "label_1"];

enum ClassificationHead {
    /// `classifier` linear on the CLS token (BERT-style checkpoints).
    Linear(Linear),
    /// `classifier.dense` + tanh + `classifier.out_proj` (RoBERTa-style checkpoints).
    Projected { dense: Linear, out_proj: Linear },
}

impl ClassificationHead {
    fn load(vb: VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Self> {
        if vb.contains_tensor("classifier.out_proj.weight") {
            let dense = candle_nn::linear(hidden_size, hidden_size, vb.pp("classifier.dense"))?;
            let out_proj =
                candle_nn::linear(hidden_size, num_labels, vb.pp("classifier.out_proj"))?;
            Ok(Self::Projected { dense, out_proj })
        } else {
            let linear = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;
            Ok(Self::Linear(linear))
        }
    }

    fn forward(&self, cls_token: &Tensor) -> Result<Tensor> {
        match self {
            Self::Linear(linear) => linear.forward(cls_token),
            Self::Projected { dense, out_proj } => {
                let hidden = dense.forward(cls_token)?.tanh()?;
                out_proj.forward(&hidden)
            }
        }
    }
}

struct SequenceClassifierImpl {
    bert: BertModel,
    head: ClassificationHead,
}

impl SequenceClassifierImpl {
    fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), config)?
        } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("roberta"), config)?
        } else {
            BertModel::load(vb.clone(), config)?
        };

        let head = ClassificationHead::load(vb, config.hidden_size, num_labels)?;

        Ok(Self { bert, head })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let output = self
            .bert
            .forward(input_ids, token_type_ids, attention_mask)?;
        let cls_token = output.i((.., 0, ..))?;
        self.head.forward(&cls_token)
    }
}

/// Label layout read from a checkpoint's `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub num_labels: usize,
    /// Index of the machine-generated class (ignored for single-logit heads).
    pub ai_index: usize,
}

impl LabelLayout {
    /// Resolves the label count and the AI class index from `id2label`/`num_labels`.
    ///
    /// Falls back to two labels with index 1 as the AI class.
    pub fn from_config_json(raw: &serde_json::Value) -> Self {
        let id2label = raw.get("id2label").and_then(|v| v.as_object());

        let num_labels = id2label
            .map(|labels| labels.len())
            .filter(|n| *n > 0)
            .or_else(|| {
                raw.get("num_labels")
                    .and_then(|v| v.as_u64())
                    .map(|n| n as usize)
            })
            .unwrap_or(2)
            .max(1);

        let ai_index = id2label
            .and_then(|labels| {
                labels.iter().find_map(|(idx, name)| {
                    let name = name.as_str()?.to_lowercase();
                    if AI_LABEL_NAMES.contains(&name.as_str()) {
                        idx.parse::<usize>().ok()
                    } else {
                        None
                    }
                })
            })
            .filter(|idx| *idx < num_labels)
            .unwrap_or(if num_labels > 1 { 1 } else { 0 });

        Self {
            num_labels,
            ai_index,
        }
    }

    /// Converts raw logits into the probability of the AI class.
    pub fn ai_probability(&self, logits: &[f32]) -> Option<f64> {
        match logits.len() {
            0 => None,
            1 => Some(sigmoid(logits[0] as f64)),
            _ => {
                let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
                let exps: Vec<f64> = logits.iter().map(|l| (*l as f64 - max).exp()).collect();
                let total: f64 = exps.iter().sum();
                exps.get(self.ai_index).map(|e| e / total)
            }
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Clone)]
pub struct SequenceClassifier {
    inner: std::sync::Arc<SequenceClassifierImpl>,
    labels: LabelLayout,
}

impl SequenceClassifier {
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        let config_content = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;
        let raw: serde_json::Value = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;
        let labels = LabelLayout::from_config_json(&raw);

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let model = SequenceClassifierImpl::load(vb, &config, labels.num_labels)?;

        Ok(Self {
            inner: std::sync::Arc::new(model),
            labels,
        })
    }

    pub fn labels(&self) -> LabelLayout {
        self.labels
    }

    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.inner.forward(input_ids, token_type_ids, attention_mask)
    }
}
