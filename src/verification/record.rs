use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CONTENT_PREVIEW_CHARS, truncate_chars};
use crate::ensemble::{Classification, EnsembleResult};
use crate::signal::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationType {
    Automatic,
    Manual,
}

/// The social post a verification was requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub post_id: Option<String>,
    pub post_url: Option<String>,
}

impl PostRef {
    /// Blank values count as absent.
    pub fn new(post_id: Option<&str>, post_url: Option<&str>) -> Self {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);
        Self {
            post_id: clean(post_id),
            post_url: clean(post_url),
        }
    }
}

/// Shared verdict for one piece of content, keyed by its normalized hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub content_hash: String,
    pub classification: Classification,
    pub confidence: f64,
    pub ai_probability: f64,
    pub view_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_verified: DateTime<Utc>,
    pub verified_by_author: bool,
    pub author_username: Option<String>,
    pub verification_type: VerificationType,
    pub platform: Option<String>,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub content_preview: Option<String>,
    /// Per-signal scores of the ensemble run that created the record.
    pub scores: Option<BTreeMap<SignalKind, Option<f64>>>,
}

pub fn content_preview(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(truncate_chars(trimmed, CONTENT_PREVIEW_CHARS).to_string())
    }
}

impl VerificationRecord {
    /// First sighting of content scored by the ensemble.
    pub fn automatic(
        content_hash: String,
        result: &EnsembleResult,
        text: &str,
        post: &PostRef,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            content_hash,
            classification: result.classification,
            confidence: result.confidence,
            ai_probability: result.ai_probability,
            view_count: 1,
            first_seen: now,
            last_verified: now,
            verified_by_author: false,
            author_username: None,
            verification_type: VerificationType::Automatic,
            platform: result.platform.clone(),
            post_id: post.post_id.clone(),
            post_url: post.post_url.clone(),
            content_preview: content_preview(text),
            scores: Some(result.per_signal_scores.clone()),
        }
    }

    /// First sighting of content vouched for by its author.
    pub fn author_verified(
        content_hash: String,
        username: &str,
        text: &str,
        platform: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            content_hash,
            classification: Classification::Human,
            confidence: 1.0,
            ai_probability: 0.0,
            view_count: 1,
            first_seen: now,
            last_verified: now,
            verified_by_author: true,
            author_username: Some(username.to_string()),
            verification_type: VerificationType::Manual,
            platform,
            post_id: None,
            post_url: None,
            content_preview: content_preview(text),
            scores: None,
        }
    }

    /// Counts another view.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.view_count = self.view_count.saturating_add(1);
        if now > self.last_verified {
            self.last_verified = now;
        }
    }

    /// Replaces the verdict with the author's, keeping history fields.
    pub fn apply_author_override(&mut self, incoming: &VerificationRecord) {
        self.classification = Classification::Human;
        self.confidence = 1.0;
        self.ai_probability = 0.0;
        self.verified_by_author = true;
        self.author_username = incoming.author_username.clone();
        self.verification_type = VerificationType::Manual;
        if self.platform.is_none() {
            self.platform = incoming.platform.clone();
        }
        if self.post_id.is_none() {
            self.post_id = incoming.post_id.clone();
        }
        if self.post_url.is_none() {
            self.post_url = incoming.post_url.clone();
        }
        if self.content_preview.is_none() {
            self.content_preview = incoming.content_preview.clone();
        }
        self.touch(incoming.last_verified);
    }
}
