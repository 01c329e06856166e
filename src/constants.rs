//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Text Limit Invariants
//!
//! The text limits are read by the combiner, by every signal producer and by the
//! verification cache (content previews). If you need runtime-configurable limits:
//!
//! 1. Use [`TextLimits`] to pass limits through initialization
//! 2. Call [`TextLimits::validate`] at module boundaries to catch bad configuration early
//! 3. The compile-time constants remain as defaults

pub const DEFAULT_MIN_TEXT_CHARS: usize = 20;
pub const DEFAULT_MIN_TEXT_WORDS: usize = 5;
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5000;

pub const DEFAULT_PRODUCER_TIMEOUT_MS: u64 = 15_000;

/// Budget for one classifier backend call. At least two links fit inside the
/// producer budget, so a hung primary still leaves room for a fallback.
pub const DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_VARIANCE_CAP: f64 = 0.3;

/// Score a producer reports when it has nothing meaningful to say.
pub const NEUTRAL_SCORE: f64 = 0.5;

pub const SHORT_INPUT_CONFIDENCE: f64 = 0.1;
pub const FAILURE_CONFIDENCE: f64 = 0.05;

/// Discount applied when fewer than two signals are available.
pub const SINGLE_SIGNAL_DISCOUNT: f64 = 0.6;

pub const SHORT_BUCKET_MAX_WORDS: usize = 50;
pub const MEDIUM_BUCKET_MAX_WORDS: usize = 150;

pub const CONTENT_PREVIEW_CHARS: usize = 200;

/// Runtime text-length configuration shared by the combiner and producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimits {
    /// Minimum trimmed character count for scoring.
    pub min_chars: usize,
    /// Minimum whitespace-separated word count for scoring.
    pub min_words: usize,
    /// Texts are truncated to this many characters before scoring.
    pub max_chars: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_TEXT_CHARS,
            min_words: DEFAULT_MIN_TEXT_WORDS,
            max_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

impl TextLimits {
    pub fn new(min_chars: usize, min_words: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            min_words,
            max_chars,
        }
    }

    /// Validates that these limits are internally consistent.
    ///
    /// Returns an error if:
    /// - `max_chars` is zero
    /// - `min_chars` exceeds `max_chars`
    pub fn validate(&self) -> Result<(), TextLimitsError> {
        if self.max_chars == 0 {
            return Err(TextLimitsError::ZeroMaximum);
        }
        if self.min_chars > self.max_chars {
            return Err(TextLimitsError::MinimumExceedsMaximum {
                min: self.min_chars,
                max: self.max_chars,
            });
        }
        Ok(())
    }

    /// Returns `true` if `text` is long enough to be scored.
    pub fn accepts(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_chars && word_count(text) >= self.min_words
    }

    /// Truncates `text` to `max_chars` characters (never splits a code point).
    pub fn truncate<'a>(&self, text: &'a str) -> &'a str {
        truncate_chars(text, self.max_chars)
    }
}

/// Error returned when text limit validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLimitsError {
    /// Maximum length cannot be zero.
    ZeroMaximum,
    /// Minimum length is larger than the maximum.
    MinimumExceedsMaximum { min: usize, max: usize },
}

impl std::fmt::Display for TextLimitsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroMaximum => write!(f, "maximum text length cannot be zero"),
            Self::MinimumExceedsMaximum { min, max } => {
                write!(
                    f,
                    "minimum text length {} exceeds maximum text length {}",
                    min, max
                )
            }
        }
    }
}

impl std::error::Error for TextLimitsError {}

/// Counts whitespace-separated words.
#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Returns the prefix of `text` holding at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
