use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::error::{StoreError, VerificationError};
use super::record::{PostRef, VerificationRecord};
use super::store::{InsertOutcome, VerificationStore};
use crate::ensemble::EnsembleResult;
use crate::hashing::{content_hash, is_content_hash};

pub const DEFAULT_STATS_TOP_N: usize = 10;

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub record: VerificationRecord,
    /// `true` when an earlier verification was reused.
    pub cached: bool,
    /// The fresh verdict, when the ensemble ran for this call.
    pub result: Option<EnsembleResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationBreakdown {
    pub human: u64,
    pub ai: u64,
    pub mixed: u64,
    pub uncertain: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVerified {
    pub content_hash: String,
    pub content_preview: Option<String>,
    pub classification: crate::ensemble::Classification,
    pub view_count: u64,
    pub platform: Option<String>,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationStats {
    pub total_unique_content: u64,
    pub total_verifications: u64,
    /// Views per unique piece of content, rounded to two decimals.
    pub network_effect_multiplier: f64,
    pub breakdown: ClassificationBreakdown,
    pub top_verified: Vec<TopVerified>,
}

/// Content-addressed verdict cache over a [`VerificationStore`].
#[derive(Debug, Clone)]
pub struct VerificationCache<S> {
    store: S,
}

impl<S: VerificationStore> VerificationCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads a record without counting a view.
    pub async fn lookup(
        &self,
        content_hash: &str,
    ) -> Result<Option<VerificationRecord>, VerificationError> {
        validate_hash(content_hash)?;
        Ok(self.store.get(content_hash).await?)
    }

    /// Reads a record and counts a view on hit.
    pub async fn check(
        &self,
        content_hash: &str,
    ) -> Result<Option<VerificationRecord>, VerificationError> {
        validate_hash(content_hash)?;
        Ok(self.store.increment_view_count(content_hash).await?)
    }

    /// Returns the shared verdict for `text`, scoring it with `factory` on first sight.
    ///
    /// If the store fails, the freshly computed verdict is still returned inside
    /// [`VerificationError::Unpersisted`].
    pub async fn verify_or_create<F, Fut>(
        &self,
        text: &str,
        factory: F,
    ) -> Result<VerifyOutcome, VerificationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EnsembleResult>,
    {
        self.verify_post(text, &PostRef::default(), factory).await
    }

    /// Like [`Self::verify_or_create`], recording `post` on a newly created record.
    #[instrument(skip(self, text, post, factory), fields(text_len = text.len()))]
    pub async fn verify_post<F, Fut>(
        &self,
        text: &str,
        post: &PostRef,
        factory: F,
    ) -> Result<VerifyOutcome, VerificationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EnsembleResult>,
    {
        let hash = content_hash(text);

        match self.store.increment_view_count(&hash).await {
            Ok(Some(record)) => {
                debug!(hash = %hash, views = record.view_count, "Verification cache hit");
                return Ok(VerifyOutcome {
                    record,
                    cached: true,
                    result: None,
                });
            }
            Ok(None) => {}
            Err(source) => {
                warn!(error = %source, "Verification store lookup failed");
                return Err(unpersisted(factory().await, source));
            }
        }

        let result = factory().await;
        let record = VerificationRecord::automatic(hash.clone(), &result, text, post, Utc::now());

        match self.store.insert_if_absent(record.clone()).await {
            Ok(InsertOutcome::Inserted) => {
                info!(
                    hash = %hash,
                    classification = %record.classification,
                    "Verification stored"
                );
                Ok(VerifyOutcome {
                    record,
                    cached: false,
                    result: Some(result),
                })
            }
            Ok(InsertOutcome::AlreadyExists) => {
                debug!(hash = %hash, "Concurrent insert won, counting view instead");
                match self.store.increment_view_count(&hash).await {
                    Ok(Some(record)) => Ok(VerifyOutcome {
                        record,
                        cached: true,
                        result: None,
                    }),
                    Ok(None) => Err(unpersisted(
                        result,
                        StoreError::Unavailable {
                            reason: format!("record {hash} vanished after insert conflict"),
                        },
                    )),
                    Err(source) => Err(unpersisted(result, source)),
                }
            }
            Err(source) => {
                warn!(error = %source, "Verification store insert failed");
                Err(unpersisted(result, source))
            }
        }
    }

    /// Marks `text` as human-written by its author. Never consults the ensemble.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn author_override(
        &self,
        text: &str,
        username: &str,
        platform: Option<&str>,
    ) -> Result<VerificationRecord, VerificationError> {
        let record = VerificationRecord::author_verified(
            content_hash(text),
            username,
            text,
            platform.map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()),
            Utc::now(),
        );

        let stored = self.store.upsert_author_override(record).await?;
        info!(hash = %stored.content_hash, username, "Author verification recorded");
        Ok(stored)
    }

    pub async fn stats(&self, top_n: usize) -> Result<VerificationStats, VerificationError> {
        let mut records = self.store.records().await?;

        let total_unique_content = records.len() as u64;
        let total_verifications: u64 = records.iter().map(|r| r.view_count).sum();
        let network_effect_multiplier = if total_unique_content > 0 {
            (total_verifications as f64 / total_unique_content as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
        for record in &records {
            *counts.entry(record.classification.category()).or_insert(0) += 1;
        }
        let breakdown = ClassificationBreakdown {
            human: counts.get("human").copied().unwrap_or(0),
            ai: counts.get("ai").copied().unwrap_or(0),
            mixed: counts.get("mixed").copied().unwrap_or(0),
            uncertain: counts.get("uncertain").copied().unwrap_or(0),
        };

        records.sort_by(|a, b| {
            b.view_count
                .cmp(&a.view_count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });

        let top_verified = records
            .into_iter()
            .take(top_n)
            .map(|r| TopVerified {
                content_hash: r.content_hash,
                content_preview: r.content_preview,
                classification: r.classification,
                view_count: r.view_count,
                platform: r.platform,
                first_seen: r.first_seen,
            })
            .collect();

        Ok(VerificationStats {
            total_unique_content,
            total_verifications,
            network_effect_multiplier,
            breakdown,
            top_verified,
        })
    }
}

fn validate_hash(content_hash: &str) -> Result<(), VerificationError> {
    if is_content_hash(content_hash) {
        Ok(())
    } else {
        Err(VerificationError::InvalidHash {
            hash: content_hash.to_string(),
        })
    }
}

fn unpersisted(result: EnsembleResult, source: StoreError) -> VerificationError {
    VerificationError::Unpersisted {
        result: Box::new(result),
        source,
    }
}
