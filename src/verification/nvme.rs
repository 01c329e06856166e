//! Durable store: one rkyv file per record, `{root}/{hash[..2]}/{hash}.rkyv`.
//!
//! Every record is loaded at [`NvmeStore::open`]. Mutations are serialized by a writer
//! lock: each one is written to a temp file, synced and renamed into place, and only then
//! swapped into the in-memory view. Readers only ever wait for that swap, never for disk.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, RwLock};
use rkyv::rancor::Error as RkyvError;
use rkyv::{Archive, Deserialize, Serialize, from_bytes, to_bytes};
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::record::{VerificationRecord, VerificationType};
use super::store::{InsertOutcome, VerificationStore};
use crate::hashing::is_content_hash;
use crate::signal::SignalKind;

const RKYV_EXTENSION: &str = "rkyv";
const TEMP_EXTENSION: &str = "rkyv.tmp";

/// On-disk form of a [`VerificationRecord`].
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct StoredRecord {
    pub content_hash: String,
    pub classification: String,
    pub confidence: f64,
    pub ai_probability: f64,
    pub view_count: u64,
    /// Unix milliseconds.
    pub first_seen: i64,
    /// Unix milliseconds.
    pub last_verified: i64,
    pub verified_by_author: bool,
    pub author_username: Option<String>,
    pub manual: bool,
    pub platform: Option<String>,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub content_preview: Option<String>,
    /// `(signal name, score)`; `None` marks an unavailable signal.
    pub scores: Option<Vec<(String, Option<f64>)>>,
}

impl From<&VerificationRecord> for StoredRecord {
    fn from(record: &VerificationRecord) -> Self {
        Self {
            content_hash: record.content_hash.clone(),
            classification: record.classification.as_str().to_string(),
            confidence: record.confidence,
            ai_probability: record.ai_probability,
            view_count: record.view_count,
            first_seen: record.first_seen.timestamp_millis(),
            last_verified: record.last_verified.timestamp_millis(),
            verified_by_author: record.verified_by_author,
            author_username: record.author_username.clone(),
            manual: record.verification_type == VerificationType::Manual,
            platform: record.platform.clone(),
            post_id: record.post_id.clone(),
            post_url: record.post_url.clone(),
            content_preview: record.content_preview.clone(),
            scores: record.scores.as_ref().map(|scores| {
                scores
                    .iter()
                    .map(|(kind, score)| (kind.as_str().to_string(), *score))
                    .collect()
            }),
        }
    }
}

impl StoredRecord {
    fn into_record(self) -> Result<VerificationRecord, String> {
        let classification = self.classification.parse()?;
        let first_seen = millis_to_datetime(self.first_seen)?;
        let last_verified = millis_to_datetime(self.last_verified)?;
        let scores = self
            .scores
            .map(|scores| {
                scores
                    .into_iter()
                    .map(|(name, score)| Ok((name.parse::<SignalKind>()?, score)))
                    .collect::<Result<BTreeMap<_, _>, String>>()
            })
            .transpose()?;

        Ok(VerificationRecord {
            content_hash: self.content_hash,
            classification,
            confidence: self.confidence,
            ai_probability: self.ai_probability,
            view_count: self.view_count,
            first_seen,
            last_verified,
            verified_by_author: self.verified_by_author,
            author_username: self.author_username,
            verification_type: if self.manual {
                VerificationType::Manual
            } else {
                VerificationType::Automatic
            },
            platform: self.platform,
            post_id: self.post_id,
            post_url: self.post_url,
            content_preview: self.content_preview,
            scores,
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| format!("timestamp out of range: {millis}"))
}

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    /// Serializes mutations across their disk I/O. Taken on the blocking pool only.
    writer: Mutex<()>,
    records: RwLock<HashMap<String, VerificationRecord>>,
}

impl Inner {
    fn record_path(&self, content_hash: &str) -> StoreResult<PathBuf> {
        if !is_content_hash(content_hash) {
            return Err(StoreError::InvalidHash {
                hash: content_hash.to_string(),
            });
        }
        Ok(self
            .root
            .join(&content_hash[..2])
            .join(format!("{}.{}", content_hash, RKYV_EXTENSION)))
    }

    /// Writes `record` durably. Caller holds the writer lock.
    fn persist(&self, record: &VerificationRecord) -> StoreResult<()> {
        let final_path = self.record_path(&record.content_hash)?;
        let temp_path = final_path.with_extension(TEMP_EXTENSION);

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = to_bytes::<RkyvError>(&StoredRecord::from(record))
            .map_err(|e| StoreError::Serialization(format!("{:?}", e)))?;

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    fn get(&self, content_hash: &str) -> Option<VerificationRecord> {
        self.records.read().get(content_hash).cloned()
    }

    /// Persists `record`, then publishes it to readers.
    fn commit(&self, _writer: &MutexGuard<'_, ()>, record: &VerificationRecord) -> StoreResult<()> {
        self.persist(record)?;
        self.records
            .write()
            .insert(record.content_hash.clone(), record.clone());
        Ok(())
    }

    fn insert_if_absent(&self, record: VerificationRecord) -> StoreResult<InsertOutcome> {
        let writer = self.writer.lock();
        if self.records.read().contains_key(&record.content_hash) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        self.commit(&writer, &record)?;
        Ok(InsertOutcome::Inserted)
    }

    fn increment(&self, content_hash: &str) -> StoreResult<Option<VerificationRecord>> {
        let writer = self.writer.lock();
        let Some(mut updated) = self.get(content_hash) else {
            return Ok(None);
        };

        updated.touch(Utc::now());
        self.commit(&writer, &updated)?;
        Ok(Some(updated))
    }

    fn upsert_author_override(&self, record: VerificationRecord) -> StoreResult<VerificationRecord> {
        let writer = self.writer.lock();
        let updated = match self.get(&record.content_hash) {
            Some(mut existing) => {
                existing.apply_author_override(&record);
                existing
            }
            None => record,
        };
        self.commit(&writer, &updated)?;
        Ok(updated)
    }
}

/// File-per-record store under a storage directory.
#[derive(Debug, Clone)]
pub struct NvmeStore {
    inner: Arc<Inner>,
}

impl NvmeStore {
    /// Opens (creating if needed) the store at `root` and loads every record.
    ///
    /// Unreadable record files are skipped with a warning; leftover temp files from an
    /// interrupted write are removed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let records = load_records(&root)?;
        info!(
            path = %root.display(),
            records = records.len(),
            "Verification store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                root,
                writer: Mutex::new(()),
                records: RwLock::new(records),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn len(&self) -> usize {
        self.inner.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks every mutation until the guard drops.
    #[cfg(test)]
    pub(crate) fn pause_writes(&self) -> MutexGuard<'_, ()> {
        self.inner.writer.lock()
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> StoreResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

fn load_records(root: &Path) -> StoreResult<HashMap<String, VerificationRecord>> {
    let mut records = HashMap::new();

    for shard in fs::read_dir(root)? {
        let shard = shard?.path();
        if !shard.is_dir() {
            continue;
        }

        for entry in fs::read_dir(&shard)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

            if name.ends_with(TEMP_EXTENSION) {
                debug!(path = %path.display(), "Removing interrupted write");
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
                continue;
            }

            if path.extension().is_none_or(|ext| ext != RKYV_EXTENSION) {
                continue;
            }

            match read_record(&path) {
                Ok(record) => {
                    records.insert(record.content_hash.clone(), record);
                }
                Err(e) => warn!(error = %e, "Skipping unreadable verification record"),
            }
        }
    }

    Ok(records)
}

fn read_record(path: &Path) -> StoreResult<VerificationRecord> {
    let bytes = fs::read(path)?;
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let stored =
        from_bytes::<StoredRecord, RkyvError>(&bytes).map_err(|e| corrupt(format!("{:?}", e)))?;
    let record = stored.into_record().map_err(corrupt)?;

    let expected = path.file_stem().and_then(|s| s.to_str());
    if expected != Some(record.content_hash.as_str()) {
        return Err(corrupt(format!(
            "file name does not match content hash {}",
            record.content_hash
        )));
    }

    Ok(record)
}

impl VerificationStore for NvmeStore {
    fn backend(&self) -> &'static str {
        "nvme"
    }

    async fn get(&self, content_hash: &str) -> StoreResult<Option<VerificationRecord>> {
        Ok(self.inner.get(content_hash))
    }

    async fn insert_if_absent(&self, record: VerificationRecord) -> StoreResult<InsertOutcome> {
        self.blocking(move |inner| inner.insert_if_absent(record))
            .await
    }

    async fn increment_view_count(
        &self,
        content_hash: &str,
    ) -> StoreResult<Option<VerificationRecord>> {
        let content_hash = content_hash.to_string();
        self.blocking(move |inner| inner.increment(&content_hash))
            .await
    }

    async fn upsert_author_override(
        &self,
        record: VerificationRecord,
    ) -> StoreResult<VerificationRecord> {
        self.blocking(move |inner| inner.upsert_author_override(record))
            .await
    }

    async fn records(&self) -> StoreResult<Vec<VerificationRecord>> {
        Ok(self.inner.records.read().values().cloned().collect())
    }
}
