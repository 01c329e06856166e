//! HTTP classifier backends: paid detection APIs, a self-hosted model server and the
//! hosted inference API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use tracing::debug;

use super::ClassifierBackend;
use super::error::{ClassifierError, ClassifierResult};
use crate::constants::truncate_chars;

pub const ZEROGPT_ENDPOINT: &str = "https://api.zerogpt.com/api/detect/detectText";
pub const GPTZERO_ENDPOINT: &str = "https://api.gptzero.me/v2/predict/text";
pub const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

/// Hosted inference truncates inputs to this many characters.
pub const HF_MAX_INPUT_CHARS: usize = 512;

pub const DEFAULT_HF_MODELS: &[&str] = &[
    "roberta-large-openai-detector",
    "andreas122001/roberta-large-finetuned-ai-detection",
];

const AI_LABELS: &[&str] = &["Fake", "LABEL_1", "AI", "Generated"];
const HUMAN_LABELS: &[&str] = &["Real", "LABEL_0", "Human", "Original"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteKind {
    ZeroGpt { api_key: String, endpoint: String },
    GptZero { api_key: String, endpoint: String },
    ModelServer { base_url: String },
    HuggingFace { model: String, base_url: String },
}

impl RemoteKind {
    pub fn zerogpt(api_key: impl Into<String>) -> Self {
        RemoteKind::ZeroGpt {
            api_key: api_key.into(),
            endpoint: ZEROGPT_ENDPOINT.to_string(),
        }
    }

    pub fn gptzero(api_key: impl Into<String>) -> Self {
        RemoteKind::GptZero {
            api_key: api_key.into(),
            endpoint: GPTZERO_ENDPOINT.to_string(),
        }
    }

    pub fn model_server(base_url: impl Into<String>) -> Self {
        RemoteKind::ModelServer {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn hugging_face(model: impl Into<String>) -> Self {
        RemoteKind::HuggingFace {
            model: model.into(),
            base_url: HF_INFERENCE_BASE.to_string(),
        }
    }

    pub fn source(&self) -> String {
        match self {
            RemoteKind::ZeroGpt { .. } => "zerogpt".to_string(),
            RemoteKind::GptZero { .. } => "gptzero".to_string(),
            RemoteKind::ModelServer { .. } => "model_server".to_string(),
            RemoteKind::HuggingFace { model, .. } => format!("huggingface:{model}"),
        }
    }
}

pub struct RemoteClassifier {
    kind: RemoteKind,
    http: HttpClient,
}

impl std::fmt::Debug for RemoteClassifier {
    // API keys stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClassifier")
            .field("source", &self.kind.source())
            .finish()
    }
}

impl RemoteClassifier {
    /// Fails if the HTTP client cannot be built with the per-request `timeout`.
    pub fn new(kind: RemoteKind, timeout: Duration) -> ClassifierResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { kind, http })
    }

    pub fn kind(&self) -> &RemoteKind {
        &self.kind
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> ClassifierResult<Value> {
        let mut request = self.http.post(url).json(&body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        // The inference API reports cold models in the body of a non-2xx response.
        if let RemoteKind::HuggingFace { model, .. } = &self.kind
            && is_loading(&payload)
        {
            return Err(ClassifierError::ModelLoading {
                model: model.clone(),
            });
        }

        if !status.is_success() {
            return Err(ClassifierError::Status {
                source_name: self.kind.source(),
                status: status.as_u16(),
            });
        }

        Ok(payload)
    }
}

#[async_trait]
impl ClassifierBackend for RemoteClassifier {
    fn source(&self) -> String {
        self.kind.source()
    }

    async fn classify(&self, text: &str) -> ClassifierResult<f64> {
        let source = self.kind.source();
        debug!(source = %source, text_len = text.len(), "Calling remote classifier");

        let probability = match &self.kind {
            RemoteKind::ZeroGpt { api_key, endpoint } => {
                let body = self
                    .post_json(
                        endpoint,
                        &[("ApiKey", api_key.as_str())],
                        json!({ "input_text": text }),
                    )
                    .await?;
                parse_zerogpt(&body)?
            }
            RemoteKind::GptZero { api_key, endpoint } => {
                let body = self
                    .post_json(
                        endpoint,
                        &[("x-api-key", api_key.as_str())],
                        json!({ "document": text }),
                    )
                    .await?;
                parse_gptzero(&body)?
            }
            RemoteKind::ModelServer { base_url } => {
                let url = format!("{base_url}/detect");
                let body = self.post_json(&url, &[], json!({ "text": text })).await?;
                parse_model_server(&body)?
            }
            RemoteKind::HuggingFace { model, base_url } => {
                let url = format!("{}/{}", base_url.trim_end_matches('/'), model);
                let inputs = truncate_chars(text, HF_MAX_INPUT_CHARS);
                let body = self.post_json(&url, &[], json!({ "inputs": inputs })).await?;
                parse_hugging_face(&body, model)?
            }
        };

        Ok(probability.clamp(0.0, 1.0))
    }
}

fn is_loading(body: &Value) -> bool {
    body.get("error")
        .and_then(Value::as_str)
        .is_some_and(|e| e.to_lowercase().contains("loading"))
}

fn finite(source: &str, value: Option<f64>, field: &str) -> ClassifierResult<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ClassifierError::malformed(
            source,
            format!("missing numeric `{field}`"),
        )),
    }
}

/// `{"success": true, "data": {"fakePercentage": 85.5}}` -> `0.855`.
pub fn parse_zerogpt(body: &Value) -> ClassifierResult<f64> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ClassifierError::malformed("zerogpt", "success flag not set"));
    }
    let pct = body
        .get("data")
        .and_then(|d| d.get("fakePercentage"))
        .and_then(Value::as_f64);
    Ok(finite("zerogpt", pct, "data.fakePercentage")? / 100.0)
}

/// `{"documents": [{"completely_generated_prob": 0.9}]}` -> `0.9`.
pub fn parse_gptzero(body: &Value) -> ClassifierResult<f64> {
    let prob = body
        .get("documents")
        .and_then(Value::as_array)
        .and_then(|docs| docs.first())
        .and_then(|doc| doc.get("completely_generated_prob"))
        .and_then(Value::as_f64);
    finite("gptzero", prob, "documents[0].completely_generated_prob")
}

/// `{"ai_probability": 0.7, ...}` -> `0.7`.
pub fn parse_model_server(body: &Value) -> ClassifierResult<f64> {
    let prob = body.get("ai_probability").and_then(Value::as_f64);
    finite("model_server", prob, "ai_probability")
}

/// `[[{"label": "Fake", "score": 0.98}, ...]]`; the first recognized label decides.
pub fn parse_hugging_face(body: &Value, model: &str) -> ClassifierResult<f64> {
    if is_loading(body) {
        return Err(ClassifierError::ModelLoading {
            model: model.to_string(),
        });
    }

    let source = format!("huggingface:{model}");
    let outer = body
        .as_array()
        .ok_or_else(|| ClassifierError::malformed(&source, "expected a list"))?;

    // Some pipelines return a flat list instead of one list per input.
    let items = match outer.first() {
        Some(Value::Array(inner)) => inner.as_slice(),
        _ => outer.as_slice(),
    };

    for item in items {
        let Some(label) = item.get("label").and_then(Value::as_str) else {
            continue;
        };
        let score = item.get("score").and_then(Value::as_f64).unwrap_or(0.5);

        if AI_LABELS.contains(&label) {
            return finite(&source, Some(score), "score");
        }
        if HUMAN_LABELS.contains(&label) {
            return finite(&source, Some(1.0 - score), "score");
        }
    }

    Err(ClassifierError::malformed(&source, "no recognized label"))
}
