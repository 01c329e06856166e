use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use super::error::StoreResult;
use super::record::VerificationRecord;
use super::store::{InsertOutcome, VerificationStore};

/// In-process store for tests and ephemeral deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, VerificationRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl VerificationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, content_hash: &str) -> StoreResult<Option<VerificationRecord>> {
        Ok(self.records.read().get(content_hash).cloned())
    }

    async fn insert_if_absent(&self, record: VerificationRecord) -> StoreResult<InsertOutcome> {
        let mut records = self.records.write();
        if records.contains_key(&record.content_hash) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.insert(record.content_hash.clone(), record);
        Ok(InsertOutcome::Inserted)
    }

    async fn increment_view_count(
        &self,
        content_hash: &str,
    ) -> StoreResult<Option<VerificationRecord>> {
        let mut records = self.records.write();
        Ok(records.get_mut(content_hash).map(|record| {
            record.touch(Utc::now());
            record.clone()
        }))
    }

    async fn upsert_author_override(
        &self,
        record: VerificationRecord,
    ) -> StoreResult<VerificationRecord> {
        let mut records = self.records.write();
        let stored = match records.get_mut(&record.content_hash) {
            Some(existing) => {
                existing.apply_author_override(&record);
                existing.clone()
            }
            None => {
                records.insert(record.content_hash.clone(), record.clone());
                record
            }
        };
        Ok(stored)
    }

    async fn records(&self) -> StoreResult<Vec<VerificationRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }
}

/// Store whose every call fails, for exercising the unpersisted path.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct UnreachableStore;

#[cfg(any(test, feature = "mock"))]
impl UnreachableStore {
    fn error() -> super::error::StoreError {
        super::error::StoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl VerificationStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _content_hash: &str) -> StoreResult<Option<VerificationRecord>> {
        Err(Self::error())
    }

    async fn insert_if_absent(&self, _record: VerificationRecord) -> StoreResult<InsertOutcome> {
        Err(Self::error())
    }

    async fn increment_view_count(
        &self,
        _content_hash: &str,
    ) -> StoreResult<Option<VerificationRecord>> {
        Err(Self::error())
    }

    async fn upsert_author_override(
        &self,
        _record: VerificationRecord,
    ) -> StoreResult<VerificationRecord> {
        Err(Self::error())
    }

    async fn records(&self) -> StoreResult<Vec<VerificationRecord>> {
        Err(Self::error())
    }
}
