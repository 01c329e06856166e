//! Indicator-phrase scorer.
//!
//! Counts weighted machine-style phrases ("delve", "in conclusion", ...) against
//! informal human markers (slang, typos, emojis, ...), normalizes per 100 words and maps
//! the balance onto `[0, 1]`.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::SignalProducer;
use super::error::SignalError;
use super::types::{SignalKind, SignalResult};
use crate::constants::word_count;

pub const PATTERN_MIN_WORDS: usize = 5;

/// Repeated AI indicators stop counting after this many hits.
const AI_REPEAT_CAP: f64 = 3.0;

/// Normalized balance mapped onto `[0, 1]`: `-2 -> 0`, `+2 -> 1`.
const BALANCE_SPAN: f64 = 2.0;

const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorSide {
    Ai,
    Human,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// Count every match of the lowercased text.
    Plain,
    /// Match against the original casing.
    CaseSensitive,
    /// Count matches whose first capture group did not participate.
    UnlessGroup,
}

struct RuleDef {
    name: &'static str,
    pattern: &'static str,
    weight: f64,
    mode: MatchMode,
}

const fn rule(name: &'static str, pattern: &'static str, weight: f64) -> RuleDef {
    RuleDef {
        name,
        pattern,
        weight,
        mode: MatchMode::Plain,
    }
}

const AI_RULES: &[RuleDef] = &[
    rule(
        "as_an_ai",
        r"\b(as an ai|as an artificial intelligence|as a language model)\b",
        0.95,
    ),
    rule(
        "i_cannot",
        r"\bi (?:cannot|can't|am unable to) (?:provide|assist|help with)\b",
        0.80,
    ),
    rule(
        "i_dont_have",
        r"\bi (?:don't|do not) have (?:access|the ability|real-time|personal)\b",
        0.75,
    ),
    rule("i_apologize", r"\bi apologize,? (?:but|for)\b", 0.60),
    rule("delve", r"\bdelve(?:s|d)?\b", 0.50),
    rule("utilize", r"\butilize(?:s|d)?\b", 0.40),
    rule("facilitate", r"\bfacilitate(?:s|d)?\b", 0.40),
    rule("leverage", r"\bleverage(?:s|d)?\b", 0.35),
    rule("robust", r"\brobust\b", 0.30),
    rule("comprehensive", r"\bcomprehensive\b", 0.30),
    rule("furthermore", r"\bfurthermore\b", 0.30),
    rule("moreover", r"\bmoreover\b", 0.30),
    rule("additionally", r"\badditionally\b", 0.25),
    rule("nonetheless", r"\bnonetheless\b", 0.30),
    rule("hence", r"\bhence\b", 0.25),
    rule("thus", r"\bthus\b", 0.20),
    rule("therefore", r"\btherefore\b", 0.20),
    rule("consequently", r"\bconsequently\b", 0.25),
    rule(
        "it_is_important",
        r"\bit(?:'s| is) (?:important|worth noting|crucial|essential|vital)\b",
        0.35,
    ),
    rule(
        "it_is_worth",
        r"\bit(?:'s| is) worth (?:noting|mentioning)\b",
        0.35,
    ),
    rule(
        "lets_explore",
        r"\blet(?:'s| us) (?:explore|dive|delve|examine)\b",
        0.40,
    ),
    rule("in_conclusion", r"\bin conclusion\b", 0.30),
    rule("to_summarize", r"\bto summarize\b", 0.30),
    rule("in_summary", r"\bin summary\b", 0.30),
    rule("in_order_to", r"\bin order to\b", 0.20),
    rule("with_regard_to", r"\bwith regard to\b", 0.25),
    rule("in_terms_of", r"\bin terms of\b", 0.20),
    rule("oxford_comma", r"\w+, \w+, and \w+", 0.10),
];

const HUMAN_RULES: &[RuleDef] = &[
    rule(
        "common_typos",
        r"\b(teh|recieve|occured|seperate|definately|wierd|untill|basicly)\b",
        -0.40,
    ),
    rule(
        "slang",
        r"\b(gonna|wanna|gotta|kinda|sorta|lol|lmao|omg|wtf|tbh|ngl|imo|imho)\b",
        -0.35,
    ),
    rule(
        "contractions",
        r"\b(i'm|you're|we're|they're|isn't|aren't|won't|can't|couldn't|wouldn't|shouldn't)\b",
        -0.15,
    ),
    rule(
        "fillers",
        r"\b(um|uh|hmm|well|like|you know|i mean|kinda|sorta)\b",
        -0.30,
    ),
    rule(
        "personal",
        r"\b(i think|i feel|i believe|in my opinion|personally|imo)\b",
        -0.20,
    ),
    rule("exclamations", r"!{2,}", -0.20),
    rule("question_emphasis", r"\?{2,}", -0.20),
    rule("ellipsis", r"\.{3,}", -0.15),
    RuleDef {
        name: "all_caps_words",
        pattern: r"\b[A-Z]{3,}\b",
        weight: -0.15,
        mode: MatchMode::CaseSensitive,
    },
    rule(
        "emojis",
        r"[\x{1F300}-\x{1F9FF}\x{1F600}-\x{1F64F}\x{1F680}-\x{1F6FF}]",
        -0.40,
    ),
    rule("yeah_nah", r"\b(yeah|yep|nope|nah|yup)\b", -0.25),
    rule(
        "abbreviations",
        r"\b(bc|rn|tho|prob|def|obv|thru|w/|btw|idk)\b",
        -0.30,
    ),
    RuleDef {
        name: "bare_numbers",
        pattern: r"\b\d+\b(\s*(?:percent|%|years|days))?",
        weight: -0.10,
        mode: MatchMode::UnlessGroup,
    },
];

struct CompiledRule {
    name: &'static str,
    regex: Regex,
    weight: f64,
    mode: MatchMode,
    side: IndicatorSide,
}

impl CompiledRule {
    fn compile(def: &RuleDef, side: IndicatorSide) -> Result<Self, regex::Error> {
        Ok(Self {
            name: def.name,
            regex: Regex::new(def.pattern)?,
            weight: def.weight,
            mode: def.mode,
            side,
        })
    }

    fn find<'t>(&self, original: &'t str, lowered: &'t str) -> Vec<&'t str> {
        match self.mode {
            MatchMode::Plain => self.regex.find_iter(lowered).map(|m| m.as_str()).collect(),
            MatchMode::CaseSensitive => {
                self.regex.find_iter(original).map(|m| m.as_str()).collect()
            }
            MatchMode::UnlessGroup => self
                .regex
                .captures_iter(lowered)
                .filter(|caps| caps.get(1).is_none())
                .filter_map(|caps| caps.get(0).map(|m| m.as_str()))
                .collect(),
        }
    }

    fn contribution(&self, count: usize) -> f64 {
        let raw = count as f64 * self.weight;
        match self.side {
            IndicatorSide::Ai => raw.min(self.weight * AI_REPEAT_CAP),
            IndicatorSide::Human => raw,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorMatch {
    #[serde(rename = "type")]
    pub side: IndicatorSide,
    pub pattern: &'static str,
    pub count: usize,
    pub weight: f64,
    pub contribution: f64,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternAnalysis {
    pub score: f64,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub word_count: usize,
    pub ai_indicators: usize,
    pub human_indicators: usize,
    pub matches: Vec<IndicatorMatch>,
}

pub struct PatternScorer {
    rules: Vec<CompiledRule>,
    min_words: usize,
}

impl std::fmt::Debug for PatternScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternScorer")
            .field("rules", &self.rules.len())
            .field("min_words", &self.min_words)
            .finish()
    }
}

impl PatternScorer {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = AI_RULES
            .iter()
            .map(|def| CompiledRule::compile(def, IndicatorSide::Ai))
            .chain(
                HUMAN_RULES
                    .iter()
                    .map(|def| CompiledRule::compile(def, IndicatorSide::Human)),
            )
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            min_words: PATTERN_MIN_WORDS,
        })
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words.max(1);
        self
    }

    /// Scores `text`, or `None` when it has fewer than the minimum word count.
    pub fn analyze(&self, text: &str) -> Option<PatternAnalysis> {
        let words = word_count(text);
        if words < self.min_words {
            return None;
        }

        let lowered = text.to_lowercase();
        let mut raw_score = 0.0;
        let mut matches = Vec::new();

        for rule in &self.rules {
            let found = rule.find(text, &lowered);
            if found.is_empty() {
                continue;
            }

            let contribution = rule.contribution(found.len());
            raw_score += contribution;
            matches.push(IndicatorMatch {
                side: rule.side,
                pattern: rule.name,
                count: found.len(),
                weight: rule.weight,
                contribution,
                examples: found
                    .iter()
                    .take(MAX_EXAMPLES)
                    .map(|s| s.to_string())
                    .collect(),
            });
        }

        let normalized_score = raw_score / (words as f64 / 100.0);
        let score = ((normalized_score + BALANCE_SPAN) / (2.0 * BALANCE_SPAN)).clamp(0.0, 1.0);

        let ai_indicators = matches
            .iter()
            .filter(|m| m.side == IndicatorSide::Ai)
            .count();

        Some(PatternAnalysis {
            score,
            raw_score,
            normalized_score,
            word_count: words,
            ai_indicators,
            human_indicators: matches.len() - ai_indicators,
            matches,
        })
    }
}

impl PatternAnalysis {
    fn into_detail(self) -> Map<String, Value> {
        match serde_json::to_value(&self) {
            Ok(Value::Object(mut map)) => {
                map.remove("score");
                map
            }
            _ => Map::new(),
        }
    }
}

#[async_trait]
impl SignalProducer for PatternScorer {
    fn kind(&self) -> SignalKind {
        SignalKind::Pattern
    }

    fn min_words(&self) -> usize {
        self.min_words
    }

    async fn produce(&self, text: &str) -> SignalResult {
        match self.analyze(text) {
            Some(analysis) => {
                debug!(
                    score = analysis.score,
                    ai = analysis.ai_indicators,
                    human = analysis.human_indicators,
                    "Pattern analysis complete"
                );
                let score = analysis.score;
                SignalResult::scored(SignalKind::Pattern, score, analysis.into_detail())
            }
            None => SignalError::InputTooShort {
                words: word_count(text),
                min: self.min_words,
            }
            .into_result(SignalKind::Pattern),
        }
    }
}

