use super::*;
use crate::ensemble::{Classification, EnsembleResult};
use crate::hashing::content_hash;
use crate::signal::SignalKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const TEXT: &str = "The committee reviewed every proposal before the final vote on Friday.";

fn verdict(classification: Classification, probability: f64) -> EnsembleResult {
    let mut result = EnsembleResult::degenerate(0.8, 11, "fixture");
    result.classification = classification;
    result.ai_probability = probability;
    result.note = None;
    result
}

fn ai_verdict() -> EnsembleResult {
    verdict(Classification::Ai, 0.92)
}

#[tokio::test]
async fn test_sequential_verify_hits_cache() {
    let cache = VerificationCache::new(MemoryStore::new());

    let first = cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.record.view_count, 1);
    assert!(first.result.is_some());

    let ran = Arc::new(AtomicUsize::new(0));
    let ran_in_factory = Arc::clone(&ran);
    let second = cache
        .verify_or_create(TEXT, move || async move {
            ran_in_factory.fetch_add(1, Ordering::SeqCst);
            ai_verdict()
        })
        .await
        .unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert!(second.cached);
    assert_eq!(second.record.view_count, 2);
    assert_eq!(second.record.classification, Classification::Ai);
    assert!(second.record.last_verified >= first.record.last_verified);
}

#[tokio::test]
async fn test_normalized_variants_share_a_record() {
    let cache = VerificationCache::new(MemoryStore::new());

    cache
        .verify_or_create("Hello   World, this is it", || async { ai_verdict() })
        .await
        .unwrap();
    let again = cache
        .verify_or_create("  hello world,\nTHIS is it ", || async { ai_verdict() })
        .await
        .unwrap();

    assert!(again.cached);
    assert_eq!(cache.store().len(), 1);
}

#[tokio::test]
async fn test_concurrent_verify_creates_one_record() {
    const N: usize = 32;
    let cache = Arc::new(VerificationCache::new(MemoryStore::new()));
    let factory_calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&factory_calls);
            tokio::spawn(async move {
                cache
                    .verify_or_create(TEXT, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        ai_verdict()
                    })
                    .await
                    .unwrap()
            })
        })
        .collect();

    let outcomes = futures::future::join_all(handles).await;
    let fresh = outcomes
        .iter()
        .filter(|o| !o.as_ref().unwrap().cached)
        .count();

    assert_eq!(fresh, 1);
    assert_eq!(cache.store().len(), 1);
    let record = cache.lookup(&content_hash(TEXT)).await.unwrap().unwrap();
    assert_eq!(record.view_count, N as u64);
    assert!(factory_calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_view_count_never_decreases() {
    let cache = VerificationCache::new(MemoryStore::new());
    let hash = content_hash(TEXT);
    let mut last = 0;

    cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();
    for i in 0..10 {
        let record = if i % 3 == 0 {
            cache.author_override(TEXT, "alice", None).await.unwrap()
        } else {
            cache.check(&hash).await.unwrap().unwrap()
        };
        assert!(record.view_count > last);
        last = record.view_count;
    }
}

#[tokio::test]
async fn test_author_override_sticks() {
    let cache = VerificationCache::new(MemoryStore::new());

    cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();
    let overridden = cache
        .author_override(TEXT, "alice", Some("Twitter"))
        .await
        .unwrap();

    assert_eq!(overridden.classification, Classification::Human);
    assert_eq!(overridden.confidence, 1.0);
    assert_eq!(overridden.ai_probability, 0.0);
    assert!(overridden.verified_by_author);
    assert_eq!(overridden.author_username.as_deref(), Some("alice"));
    assert_eq!(overridden.verification_type, VerificationType::Manual);
    assert_eq!(overridden.view_count, 2);

    let later = cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();
    assert!(later.cached);
    assert_eq!(later.record.classification, Classification::Human);
    assert_eq!(later.record.confidence, 1.0);
    assert_eq!(later.record.view_count, 3);
}

#[tokio::test]
async fn test_author_override_creates_record() {
    let cache = VerificationCache::new(MemoryStore::new());

    let record = cache.author_override(TEXT, "bob", None).await.unwrap();

    assert_eq!(record.view_count, 1);
    assert_eq!(record.content_hash, content_hash(TEXT));
    assert_eq!(record.content_preview.as_deref(), Some(TEXT));
}

#[tokio::test]
async fn test_second_override_replaces_author() {
    let cache = VerificationCache::new(MemoryStore::new());

    cache.author_override(TEXT, "alice", None).await.unwrap();
    let record = cache.author_override(TEXT, "carol", None).await.unwrap();

    assert_eq!(record.author_username.as_deref(), Some("carol"));
    assert_eq!(record.view_count, 2);
}

#[tokio::test]
async fn test_check_and_lookup() {
    let cache = VerificationCache::new(MemoryStore::new());
    let hash = content_hash(TEXT);

    assert!(cache.check(&hash).await.unwrap().is_none());

    cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();

    assert_eq!(cache.lookup(&hash).await.unwrap().unwrap().view_count, 1);
    assert_eq!(cache.check(&hash).await.unwrap().unwrap().view_count, 2);
    assert_eq!(cache.lookup(&hash).await.unwrap().unwrap().view_count, 2);

    assert!(matches!(
        cache.check("not-a-hash").await,
        Err(VerificationError::InvalidHash { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_store_returns_verdict() {
    let cache = VerificationCache::new(UnreachableStore);

    let err = cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap_err();

    let result = err.ensemble_result().unwrap();
    assert_eq!(result.classification, Classification::Ai);
    assert!(matches!(err, VerificationError::Unpersisted { .. }));
}

#[tokio::test]
async fn test_platform_and_preview_recorded() {
    let cache = VerificationCache::new(MemoryStore::new());
    let long_text = "word ".repeat(100);

    let mut result = ai_verdict();
    result.platform = Some("twitter".to_string());
    let outcome = cache
        .verify_or_create(&long_text, move || async move { result })
        .await
        .unwrap();

    assert_eq!(outcome.record.platform.as_deref(), Some("twitter"));
    assert_eq!(
        outcome.record.content_preview.as_ref().unwrap().chars().count(),
        200
    );
}

#[tokio::test]
async fn test_stats() {
    let cache = VerificationCache::new(MemoryStore::new());
    let texts = [
        "First sample text that is long enough to count.",
        "Second sample text that is long enough to count.",
        "Third sample text that is long enough to count.",
    ];

    cache
        .verify_or_create(texts[0], || async { ai_verdict() })
        .await
        .unwrap();
    cache
        .verify_or_create(texts[1], || async { verdict(Classification::LikelyHuman, 0.3) })
        .await
        .unwrap();
    cache
        .verify_or_create(texts[2], || async { verdict(Classification::Mixed, 0.5) })
        .await
        .unwrap();
    for _ in 0..3 {
        cache
            .verify_or_create(texts[1], || async { ai_verdict() })
            .await
            .unwrap();
    }

    let stats = cache.stats(2).await.unwrap();

    assert_eq!(stats.total_unique_content, 3);
    assert_eq!(stats.total_verifications, 6);
    assert_eq!(stats.network_effect_multiplier, 2.0);
    assert_eq!(
        stats.breakdown,
        ClassificationBreakdown {
            human: 1,
            ai: 1,
            mixed: 1,
            uncertain: 0
        }
    );
    assert_eq!(stats.top_verified.len(), 2);
    assert_eq!(stats.top_verified[0].view_count, 4);
    assert_eq!(
        stats.top_verified[0].classification,
        Classification::LikelyHuman
    );
}

#[tokio::test]
async fn test_stats_empty() {
    let stats = VerificationCache::new(MemoryStore::new())
        .stats(DEFAULT_STATS_TOP_N)
        .await
        .unwrap();
    assert_eq!(stats.total_unique_content, 0);
    assert_eq!(stats.network_effect_multiplier, 0.0);
    assert!(stats.top_verified.is_empty());
}

#[tokio::test]
async fn test_nvme_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let hash = content_hash(TEXT);

    {
        let cache = VerificationCache::new(NvmeStore::open(dir.path()).unwrap());
        cache
            .verify_or_create(TEXT, || async { ai_verdict() })
            .await
            .unwrap();
        cache.check(&hash).await.unwrap();
    }

    let path = dir.path().join(&hash[..2]).join(format!("{hash}.rkyv"));
    assert!(path.exists());

    let reopened = VerificationCache::new(NvmeStore::open(dir.path()).unwrap());
    let record = reopened.lookup(&hash).await.unwrap().unwrap();
    assert_eq!(record.view_count, 2);
    assert_eq!(record.classification, Classification::Ai);
    assert_eq!(record.content_preview.as_deref(), Some(TEXT));
}

#[tokio::test]
async fn test_nvme_store_keeps_post_and_signal_scores() {
    let dir = TempDir::new().unwrap();
    let hash = content_hash(TEXT);
    let post = PostRef::new(Some(" 1789 "), Some("https://x.com/someone/status/1789"));

    {
        let cache = VerificationCache::new(NvmeStore::open(dir.path()).unwrap());
        cache
            .verify_post(TEXT, &post, || async {
                let mut result = ai_verdict();
                result.per_signal_scores.insert(SignalKind::Pattern, Some(0.81));
                result.per_signal_scores.insert(SignalKind::Statistical, Some(0.64));
                result
            })
            .await
            .unwrap();
    }

    let cache = VerificationCache::new(NvmeStore::open(dir.path()).unwrap());
    let outcome = cache
        .verify_post(TEXT, &PostRef::default(), || async {
            verdict(Classification::Human, 0.0)
        })
        .await
        .unwrap();
    assert!(outcome.cached);
    assert!(outcome.result.is_none());

    let record = outcome.record;
    assert_eq!(record.classification, Classification::Ai);
    assert_eq!(record.post_id.as_deref(), Some("1789"));
    assert_eq!(
        record.post_url.as_deref(),
        Some("https://x.com/someone/status/1789")
    );
    let scores = record.scores.expect("scores stored with the verdict");
    assert_eq!(scores[&SignalKind::Pattern], Some(0.81));
    assert_eq!(scores[&SignalKind::Statistical], Some(0.64));
    assert_eq!(scores[&SignalKind::Classifier], None);
    assert_eq!(scores.len(), 3);
    assert_eq!(
        cache.lookup(&hash).await.unwrap().unwrap().view_count,
        2
    );
}

#[tokio::test]
async fn test_nvme_reads_do_not_wait_for_pending_writes() {
    let dir = TempDir::new().unwrap();
    let store = NvmeStore::open(dir.path()).unwrap();
    let hash = content_hash(TEXT);
    VerificationCache::new(store.clone())
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();

    let paused = store.pause_writes();
    let pending = tokio::spawn({
        let store = store.clone();
        let hash = hash.clone();
        async move { store.increment_view_count(&hash).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let budget = std::time::Duration::from_millis(500);
    let read = tokio::time::timeout(budget, store.get(&hash))
        .await
        .expect("get must not wait for the writer")
        .unwrap()
        .unwrap();
    assert_eq!(read.view_count, 1);
    let all = tokio::time::timeout(budget, store.records())
        .await
        .expect("records must not wait for the writer")
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(!pending.is_finished());

    drop(paused);
    let bumped = pending.await.unwrap().unwrap().unwrap();
    assert_eq!(bumped.view_count, 2);
    assert_eq!(store.get(&hash).await.unwrap().unwrap().view_count, 2);
}

#[tokio::test]
async fn test_nvme_store_author_override_persists() {
    let dir = TempDir::new().unwrap();
    let hash = content_hash(TEXT);

    {
        let cache = VerificationCache::new(NvmeStore::open(dir.path()).unwrap());
        cache
            .verify_or_create(TEXT, || async { ai_verdict() })
            .await
            .unwrap();
        cache.author_override(TEXT, "alice", None).await.unwrap();
    }

    let store = NvmeStore::open(dir.path()).unwrap();
    let record = store.get(&hash).await.unwrap().unwrap();
    assert!(record.verified_by_author);
    assert_eq!(record.verification_type, VerificationType::Manual);
    assert_eq!(record.view_count, 2);
}

#[tokio::test]
async fn test_nvme_store_skips_corrupt_and_temp_files() {
    let dir = TempDir::new().unwrap();
    let shard = dir.path().join("ab");
    std::fs::create_dir_all(&shard).unwrap();
    let bogus = format!("ab{}", "0".repeat(62));
    std::fs::write(shard.join(format!("{bogus}.rkyv")), b"not rkyv").unwrap();
    std::fs::write(shard.join(format!("{bogus}.rkyv.tmp")), b"partial").unwrap();

    let store = NvmeStore::open(dir.path()).unwrap();

    assert!(store.is_empty());
    assert!(!shard.join(format!("{bogus}.rkyv.tmp")).exists());
}

#[tokio::test]
async fn test_nvme_store_rejects_invalid_hash() {
    let dir = TempDir::new().unwrap();
    let store = NvmeStore::open(dir.path()).unwrap();

    let mut record = VerificationRecord::automatic(
        "../escape".to_string(),
        &ai_verdict(),
        TEXT,
        &PostRef::default(),
        chrono::Utc::now(),
    );
    let err = store.insert_if_absent(record.clone()).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidHash { .. }));

    record.content_hash = content_hash(TEXT);
    assert_eq!(
        store.insert_if_absent(record.clone()).await.unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_if_absent(record).await.unwrap(),
        InsertOutcome::AlreadyExists
    );
}

#[tokio::test]
async fn test_nvme_concurrent_increments() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(VerificationCache::new(NvmeStore::open(dir.path()).unwrap()));
    let hash = content_hash(TEXT);

    cache
        .verify_or_create(TEXT, || async { ai_verdict() })
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let hash = hash.clone();
            tokio::spawn(async move { cache.check(&hash).await.unwrap() })
        })
        .collect();
    futures::future::join_all(handles).await;

    let reopened = NvmeStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get(&hash).await.unwrap().unwrap().view_count, 17);
}

#[test]
fn test_stored_record_conversion() {
    let record = VerificationRecord::author_verified(
        content_hash(TEXT),
        "alice",
        TEXT,
        Some("x".to_string()),
        chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
    );

    let stored = StoredRecord::from(&record);
    assert_eq!(stored.classification, "HUMAN");
    assert!(stored.manual);
    assert_eq!(stored.first_seen, 1_700_000_000_123);
    assert_eq!(stored.scores, None);
    assert_eq!(stored.post_id, None);
}

#[test]
fn test_post_ref_drops_blank_values() {
    let post = PostRef::new(Some("  "), None);
    assert_eq!(post, PostRef::default());
}

#[test]
fn test_status_header_values() {
    assert_eq!(VerifilyStatus::Miss.as_header_value(), "MISS");
    assert_eq!(VerifilyStatus::Hit.to_string(), "HIT");
    assert_eq!(VerifilyStatus::Override.as_header_value(), "OVERRIDE");
    assert!(VerifilyStatus::from_cached(true).is_hit());
    assert!(!VerifilyStatus::from_cached(false).is_hit());
}
