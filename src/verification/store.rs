use std::future::Future;

use super::error::StoreResult;
use super::record::VerificationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another writer got there first; nothing was written.
    AlreadyExists,
}

/// Backing store for verification records. Each mutating call is atomic per hash.
pub trait VerificationStore: Send + Sync {
    /// Short backend name for readiness reporting.
    fn backend(&self) -> &'static str;

    fn get(
        &self,
        content_hash: &str,
    ) -> impl Future<Output = StoreResult<Option<VerificationRecord>>> + Send;

    fn insert_if_absent(
        &self,
        record: VerificationRecord,
    ) -> impl Future<Output = StoreResult<InsertOutcome>> + Send;

    /// Adds one view and refreshes `last_verified`. `None` if the hash is unknown.
    fn increment_view_count(
        &self,
        content_hash: &str,
    ) -> impl Future<Output = StoreResult<Option<VerificationRecord>>> + Send;

    /// Applies an author override to the existing record (counting a view) or stores
    /// `record` as a new one.
    fn upsert_author_override(
        &self,
        record: VerificationRecord,
    ) -> impl Future<Output = StoreResult<VerificationRecord>> + Send;

    fn records(&self) -> impl Future<Output = StoreResult<Vec<VerificationRecord>>> + Send;
}
