//! Stylometric scorer built from sentence-length and vocabulary statistics.
//!
//! Machine text tends towards uniform sentence lengths, predictable word choice and a
//! repetitive vocabulary; each metric below lands in `[0, 1]` with `1` meaning "more
//! human-like" except `uniformity`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::SignalProducer;
use super::error::SignalError;
use super::types::{SignalKind, SignalResult};
use crate::constants::{NEUTRAL_SCORE, word_count};

pub const STATISTICAL_MIN_WORDS: usize = 10;

/// Sentences this short (in characters, trimmed) are ignored for structure metrics.
const MIN_SENTENCE_CHARS: usize = 5;
const MIN_SENTENCES: usize = 3;
/// Vocabulary metrics need at least this many tokens.
const MIN_TOKENS: usize = 10;

const BURSTINESS_CV_SCALE: f64 = 0.8;
const ENTROPY_SCALE_BITS: f64 = 10.0;
const DIVERSITY_SCALE: f64 = 0.8;

const WEIGHT_BURSTINESS: f64 = 0.40;
const WEIGHT_PERPLEXITY: f64 = 0.25;
const WEIGHT_UNIFORMITY: f64 = 0.20;
const WEIGHT_DIVERSITY: f64 = 0.15;

const COMMON_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say",
    "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticalMetrics {
    pub burstiness: f64,
    pub perplexity: f64,
    pub vocabulary_diversity: f64,
    pub readability: f64,
    pub uniformity: f64,
}

impl StatisticalMetrics {
    pub fn measure(text: &str) -> Self {
        let sentences = sentences(text);
        let structural: Vec<&str> = sentences
            .iter()
            .copied()
            .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
            .collect();
        let lowered = text.to_lowercase();
        let words = tokens(&lowered);

        Self {
            burstiness: burstiness(&structural),
            perplexity: perplexity(&words),
            vocabulary_diversity: vocabulary_diversity(&words),
            readability: readability(sentences.len(), words.len()),
            uniformity: uniformity(&structural),
        }
    }

    pub fn ai_score(&self) -> f64 {
        let score = (1.0 - self.burstiness) * WEIGHT_BURSTINESS
            + (1.0 - self.perplexity) * WEIGHT_PERPLEXITY
            + self.uniformity * WEIGHT_UNIFORMITY
            + (1.0 - self.vocabulary_diversity) * WEIGHT_DIVERSITY;
        score.clamp(0.0, 1.0)
    }

    pub fn interpretation(&self) -> &'static str {
        if self.uniformity > 0.7 && self.burstiness < 0.3 {
            "Highly uniform structure suggests AI generation"
        } else if self.perplexity < 0.3 && self.vocabulary_diversity < 0.4 {
            "Predictable word choices indicate possible AI content"
        } else if self.burstiness > 0.6 && self.vocabulary_diversity > 0.6 {
            "Varied structure and vocabulary suggest human writing"
        } else if self.perplexity > 0.6 {
            "Unpredictable language patterns indicate human authorship"
        } else {
            "Mixed signals - could be human or AI"
        }
    }
}

/// Word-character runs, as `\w+` would match them.
fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect()
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn sentence_lengths(sentences: &[&str]) -> Vec<f64> {
    sentences
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Coefficient of variation of sentence lengths, scaled so `0.8` saturates.
fn burstiness(sentences: &[&str]) -> f64 {
    if sentences.len() < MIN_SENTENCES {
        return NEUTRAL_SCORE;
    }

    let lengths = sentence_lengths(sentences);
    let mean_length = mean(&lengths);
    if mean_length == 0.0 {
        return NEUTRAL_SCORE;
    }

    let variance = lengths
        .iter()
        .map(|l| (l - mean_length).powi(2))
        .sum::<f64>()
        / lengths.len() as f64;
    let cv = variance.sqrt() / mean_length;

    (cv / BURSTINESS_CV_SCALE).min(1.0)
}

/// Shannon entropy of the token distribution blended with the share of uncommon words.
fn perplexity(tokens: &[&str]) -> f64 {
    if tokens.len() < MIN_TOKENS {
        return NEUTRAL_SCORE;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    let common: HashSet<&str> = COMMON_WORDS.iter().copied().collect();
    let rare_ratio = tokens.iter().filter(|t| !common.contains(*t)).count() as f64 / total;

    ((entropy / ENTROPY_SCALE_BITS).min(1.0) * 0.7 + rare_ratio * 0.3).min(1.0)
}

/// Length-adjusted type-token ratio.
fn vocabulary_diversity(tokens: &[&str]) -> f64 {
    if tokens.len() < MIN_TOKENS {
        return NEUTRAL_SCORE;
    }

    let unique = tokens.iter().collect::<HashSet<_>>().len() as f64;
    let total = tokens.len() as f64;
    let adjusted = unique / total * (total + 1.0).ln();

    (adjusted / DIVERSITY_SCALE).min(1.0)
}

/// Peaks at 10–20 words per sentence.
fn readability(sentence_count: usize, token_count: usize) -> f64 {
    if sentence_count == 0 || token_count == 0 {
        return NEUTRAL_SCORE;
    }

    let avg = token_count as f64 / sentence_count as f64;
    if avg < 10.0 {
        avg / 10.0
    } else if avg <= 20.0 {
        1.0
    } else {
        (1.0 - (avg - 20.0) / 30.0).max(0.0)
    }
}

/// One minus the mean absolute deviation of sentence lengths relative to their mean.
fn uniformity(sentences: &[&str]) -> f64 {
    if sentences.len() < MIN_SENTENCES {
        return NEUTRAL_SCORE;
    }

    let lengths = sentence_lengths(sentences);
    let mean_length = mean(&lengths);
    if mean_length == 0.0 {
        return NEUTRAL_SCORE;
    }

    let deviations: Vec<f64> = lengths.iter().map(|l| (l - mean_length).abs()).collect();
    1.0 - (mean(&deviations) / mean_length).min(1.0)
}

#[derive(Debug, Clone)]
pub struct StatisticalScorer {
    min_words: usize,
}

impl Default for StatisticalScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticalScorer {
    pub fn new() -> Self {
        Self {
            min_words: STATISTICAL_MIN_WORDS,
        }
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words.max(1);
        self
    }

    /// Measures `text`, or `None` when it has fewer than the minimum word count.
    pub fn analyze(&self, text: &str) -> Option<StatisticalMetrics> {
        if word_count(text) < self.min_words {
            return None;
        }
        Some(StatisticalMetrics::measure(text))
    }
}

#[async_trait]
impl SignalProducer for StatisticalScorer {
    fn kind(&self) -> SignalKind {
        SignalKind::Statistical
    }

    fn min_words(&self) -> usize {
        self.min_words
    }

    async fn produce(&self, text: &str) -> SignalResult {
        let Some(metrics) = self.analyze(text) else {
            return SignalError::InputTooShort {
                words: word_count(text),
                min: self.min_words,
            }
            .into_result(SignalKind::Statistical);
        };

        let score = metrics.ai_score();
        debug!(score, ?metrics, "Statistical analysis complete");

        let mut detail = Map::new();
        if let Ok(value) = serde_json::to_value(metrics) {
            detail.insert("metrics".to_string(), value);
        }
        detail.insert(
            "interpretation".to_string(),
            Value::String(metrics.interpretation().to_string()),
        );

        SignalResult::scored(SignalKind::Statistical, score, detail)
    }
}
