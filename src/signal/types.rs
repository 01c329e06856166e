use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::constants::NEUTRAL_SCORE;

/// Identifies a signal producer within the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Pattern,
    Statistical,
    Classifier,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::Pattern,
        SignalKind::Statistical,
        SignalKind::Classifier,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SignalKind::Pattern => "pattern",
            SignalKind::Statistical => "statistical",
            SignalKind::Classifier => "classifier",
        }
    }

    /// Pattern and statistical scorers run locally and never touch the network.
    pub const fn is_heuristic(self) -> bool {
        matches!(self, SignalKind::Pattern | SignalKind::Statistical)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(SignalKind::Pattern),
            "statistical" => Ok(SignalKind::Statistical),
            "classifier" | "ml" => Ok(SignalKind::Classifier),
            other => Err(format!("unknown signal kind: {other}")),
        }
    }
}

/// Output of one producer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub kind: SignalKind,
    /// Probability-like score in `[0, 1]`; `0.5` whenever `available` is false.
    pub score: f64,
    pub available: bool,
    pub latency_ms: f64,
    /// Producer-specific diagnostics. Opaque to the combiner.
    pub detail: Map<String, Value>,
}

impl SignalResult {
    /// A successful score. Non-finite scores are treated as unavailable.
    pub fn scored(kind: SignalKind, score: f64, detail: Map<String, Value>) -> Self {
        if !score.is_finite() {
            return Self::unavailable(kind, "producer returned a non-finite score");
        }
        Self {
            kind,
            score: score.clamp(0.0, 1.0),
            available: true,
            latency_ms: 0.0,
            detail,
        }
    }

    pub fn unavailable(kind: SignalKind, reason: impl Into<String>) -> Self {
        let mut detail = Map::new();
        detail.insert("reason".to_string(), Value::String(reason.into()));
        Self {
            kind,
            score: NEUTRAL_SCORE,
            available: false,
            latency_ms: 0.0,
            detail,
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }

    /// The score when available, `None` otherwise.
    pub fn available_score(&self) -> Option<f64> {
        self.available.then_some(self.score)
    }

    pub fn reason(&self) -> Option<&str> {
        self.detail.get("reason").and_then(Value::as_str)
    }
}
