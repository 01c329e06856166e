use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{MEDIUM_BUCKET_MAX_WORDS, SHORT_BUCKET_MAX_WORDS};
use crate::signal::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Ai,
    LikelyAi,
    Mixed,
    LikelyHuman,
    Human,
    Uncertain,
}

impl Classification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Classification::Ai => "AI",
            Classification::LikelyAi => "LIKELY_AI",
            Classification::Mixed => "MIXED",
            Classification::LikelyHuman => "LIKELY_HUMAN",
            Classification::Human => "HUMAN",
            Classification::Uncertain => "UNCERTAIN",
        }
    }

    /// Coarse grouping used by verification statistics.
    pub const fn category(self) -> &'static str {
        match self {
            Classification::Ai | Classification::LikelyAi => "ai",
            Classification::Human | Classification::LikelyHuman => "human",
            Classification::Mixed => "mixed",
            Classification::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AI" => Ok(Classification::Ai),
            "LIKELY_AI" => Ok(Classification::LikelyAi),
            "MIXED" => Ok(Classification::Mixed),
            "LIKELY_HUMAN" => Ok(Classification::LikelyHuman),
            "HUMAN" => Ok(Classification::Human),
            "UNCERTAIN" => Ok(Classification::Uncertain),
            other => Err(format!("unknown classification: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

impl LengthBucket {
    /// `< 50` words is short, `50..=150` medium, anything longer is long.
    pub fn for_word_count(words: usize) -> Self {
        if words < SHORT_BUCKET_MAX_WORDS {
            LengthBucket::Short
        } else if words <= MEDIUM_BUCKET_MAX_WORDS {
            LengthBucket::Medium
        } else {
            LengthBucket::Long
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LengthBucket::Short => "short",
            LengthBucket::Medium => "medium",
            LengthBucket::Long => "long",
        }
    }
}

/// Combined verdict for one text.
///
/// `ai_probability` and `confidence` are always defined, even when no producer answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub ai_probability: f64,
    pub classification: Classification,
    pub confidence: f64,
    /// `None` marks a signal that was unavailable for this request.
    pub per_signal_scores: BTreeMap<SignalKind, Option<f64>>,
    pub weights_used: BTreeMap<SignalKind, f64>,
    pub inference_time_ms: f64,
    pub word_count: usize,
    pub length_bucket: Option<LengthBucket>,
    pub platform: Option<String>,
    pub details: BTreeMap<SignalKind, Map<String, Value>>,
    /// Set when the result is a fallback rather than a combination of signals.
    pub note: Option<String>,
}

impl EnsembleResult {
    /// A verdict that carries no evidence: `UNCERTAIN` at the neutral probability.
    pub fn degenerate(confidence: f64, word_count: usize, note: impl Into<String>) -> Self {
        Self {
            ai_probability: crate::constants::NEUTRAL_SCORE,
            classification: Classification::Uncertain,
            confidence,
            per_signal_scores: SignalKind::ALL.iter().map(|k| (*k, None)).collect(),
            weights_used: SignalKind::ALL.iter().map(|k| (*k, 0.0)).collect(),
            inference_time_ms: 0.0,
            word_count,
            length_bucket: None,
            platform: None,
            details: BTreeMap::new(),
            note: Some(note.into()),
        }
    }

    pub fn available_signals(&self) -> usize {
        self.per_signal_scores.values().filter(|s| s.is_some()).count()
    }

    pub fn score(&self, kind: SignalKind) -> Option<f64> {
        self.per_signal_scores.get(&kind).copied().flatten()
    }

    pub fn weight(&self, kind: SignalKind) -> f64 {
        self.weights_used.get(&kind).copied().unwrap_or(0.0)
    }
}
