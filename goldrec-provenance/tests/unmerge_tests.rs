use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use goldrec_model::Provenance;
use goldrec_provenance::{
    InMemoryProvenanceStore, InMemorySourceRecordArchive, ProvenanceStore, RecordPersistence,
    SourceRecordArchive, StoreError, StoreResult, UnmergeError, UnmergeExecutor, UnmergeMode,
    UnmergeOptions, UnmergeRequest,
};
use goldrec_types::{FixedClock, RecordId, SourceRecord};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn t(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ids(raw: &[&str]) -> Vec<RecordId> {
    raw.iter().map(|s| RecordId::from(*s)).collect()
}

fn make_record(id: &str, name: &str) -> SourceRecord {
    SourceRecord::at(id, json!({ "name": name }), t(1))
}

/// Archive wrapper counting every call that reaches the backing archive.
#[derive(Default)]
struct RecordingArchive {
    inner: InMemorySourceRecordArchive<Value>,
    calls: AtomicUsize,
}

impl RecordingArchive {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceRecordArchive<Value> for RecordingArchive {
    async fn archive(&self, records: &[SourceRecord], golden: &RecordId) -> StoreResult<()> {
        self.touch();
        self.inner.archive(records, golden).await
    }

    async fn get(&self, ids: &[RecordId]) -> StoreResult<Vec<SourceRecord>> {
        self.touch();
        self.inner.get(ids).await
    }

    async fn remove(&self, ids: &[RecordId]) -> StoreResult<()> {
        self.touch();
        self.inner.remove(ids).await
    }

    async fn exists(&self, ids: &[RecordId]) -> StoreResult<BTreeMap<RecordId, bool>> {
        self.touch();
        self.inner.exists(ids).await
    }

    async fn get_by_golden_record(&self, golden: &RecordId) -> StoreResult<Vec<SourceRecord>> {
        self.touch();
        self.inner.get_by_golden_record(golden).await
    }
}

/// Persistence that logs each callback and can fail restores on demand.
#[derive(Default)]
struct RecordingPersistence {
    log: Mutex<Vec<String>>,
    fail_restore_of: Option<RecordId>,
}

impl RecordingPersistence {
    fn failing_restore(id: &str) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            fail_restore_of: Some(RecordId::from(id)),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordPersistence<Value> for RecordingPersistence {
    async fn restore_record(&self, record: &SourceRecord) -> StoreResult<()> {
        if self.fail_restore_of.as_ref() == Some(&record.id) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.log.lock().unwrap().push(format!("restore:{}", record.id));
        Ok(())
    }

    async fn delete_golden_record(&self, golden: &RecordId) -> StoreResult<()> {
        self.log.lock().unwrap().push(format!("delete:{golden}"));
        Ok(())
    }
}

struct Fixture {
    store: Arc<InMemoryProvenanceStore>,
    archive: Arc<RecordingArchive>,
    persistence: Arc<RecordingPersistence>,
    executor: UnmergeExecutor<Value>,
}

async fn setup_with(persistence: RecordingPersistence) -> Fixture {
    init_tracing();
    let store = Arc::new(InMemoryProvenanceStore::new());
    let archive = Arc::new(RecordingArchive::default());
    let persistence = Arc::new(persistence);

    let provenance = Provenance::new(RecordId::from("g1"), ids(&["a", "b", "c"]), t(2), "merger");
    store.save(&provenance).await.unwrap();
    archive
        .inner
        .archive(
            &[
                make_record("a", "Jon"),
                make_record("b", "John"),
                make_record("c", "Johnny"),
            ],
            &RecordId::from("g1"),
        )
        .await
        .unwrap();

    let executor = UnmergeExecutor::<Value>::new(store.clone(), archive.clone())
        .with_persistence(persistence.clone())
        .with_clock(Arc::new(FixedClock::new(t(10))));
    Fixture {
        store,
        archive,
        persistence,
        executor,
    }
}

async fn setup() -> Fixture {
    setup_with(RecordingPersistence::default()).await
}

fn request() -> UnmergeRequest {
    UnmergeRequest::new("g1", "auditor").with_reason("wrong person")
}

// ── Full unmerge ─────────────────────────────────────────────────

#[tokio::test]
async fn full_unmerge_restores_everything_and_deletes_golden() {
    let fx = setup().await;
    let out = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::full())
        .await
        .unwrap();

    let restored: Vec<_> = out.restored_records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(restored, ids(&["a", "b", "c"]));
    assert!(out.golden_record_deleted);
    assert!(out.remaining_source_record_ids.is_empty());
    assert!(!out.original_provenance.unmerged);

    assert_eq!(
        fx.persistence.log(),
        vec!["restore:a", "restore:b", "restore:c", "delete:g1"]
    );
    assert!(fx.archive.inner.is_empty().await);

    let p = fx.store.get(&RecordId::from("g1")).await.unwrap().unwrap();
    assert!(p.unmerged);
    assert_eq!(p.unmerged_at, Some(t(10)));
    assert_eq!(p.unmerged_by.as_deref(), Some("auditor"));
    assert_eq!(p.reason.as_deref(), Some("wrong person"));
}

#[tokio::test]
async fn full_unmerge_can_keep_golden_record() {
    let fx = setup().await;
    let out = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::full().delete_golden_record(false))
        .await
        .unwrap();

    assert!(!out.golden_record_deleted);
    assert!(!fx.persistence.log().iter().any(|l| l.starts_with("delete:")));
}

#[tokio::test]
async fn unmerge_without_persistence_still_completes() {
    let store = Arc::new(InMemoryProvenanceStore::new());
    let archive = Arc::new(InMemorySourceRecordArchive::new());
    store
        .save(&Provenance::new(RecordId::from("g1"), ids(&["a", "b"]), t(2), "merger"))
        .await
        .unwrap();
    archive
        .archive(&[make_record("a", "Jon"), make_record("b", "John")], &RecordId::from("g1"))
        .await
        .unwrap();

    let executor = UnmergeExecutor::<Value>::new(store.clone(), archive.clone());
    let out = executor
        .unmerge(&request(), &UnmergeOptions::default())
        .await
        .unwrap();

    assert_eq!(out.restored_records.len(), 2);
    assert!(out.golden_record_deleted);
    assert!(archive.is_empty().await);
}

// ── Partial / split ──────────────────────────────────────────────

#[tokio::test]
async fn partial_unmerge_restores_subset_and_keeps_golden() {
    let fx = setup().await;
    let out = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::partial(ids(&["b"])))
        .await
        .unwrap();

    assert_eq!(out.restored_records.len(), 1);
    assert_eq!(out.restored_records[0].record, json!({ "name": "John" }));
    assert!(!out.golden_record_deleted);
    assert_eq!(out.remaining_source_record_ids, ids(&["a", "c"]));
    assert_eq!(fx.persistence.log(), vec!["restore:b"]);

    let exists = fx.archive.inner.exists(&ids(&["a", "b", "c"])).await.unwrap();
    assert_eq!(exists[&RecordId::from("b")], false);
    assert_eq!(exists[&RecordId::from("a")], true);
}

#[tokio::test]
async fn split_behaves_like_partial_by_default() {
    let fx = setup().await;
    let out = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::split(ids(&["a", "c", "a"])))
        .await
        .unwrap();

    let restored: Vec<_> = out.restored_records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(restored, ids(&["a", "c"]));
    assert!(!out.golden_record_deleted);
    assert_eq!(out.remaining_source_record_ids, ids(&["b"]));
}

#[tokio::test]
async fn partial_with_empty_subset_fails_before_archive_access() {
    let fx = setup().await;
    let err = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::partial(Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, UnmergeError::InvalidRequest { .. }));
    assert_eq!(err.code(), "INVALID_UNMERGE_REQUEST");
    assert_eq!(fx.archive.calls(), 0);
}

#[tokio::test]
async fn partial_without_subset_fails() {
    let fx = setup().await;
    let options = UnmergeOptions {
        mode: UnmergeMode::Partial,
        ..UnmergeOptions::default()
    };
    let err = fx.executor.unmerge(&request(), &options).await.unwrap_err();
    assert!(matches!(err, UnmergeError::InvalidRequest { .. }));
    assert_eq!(fx.archive.calls(), 0);
}

#[tokio::test]
async fn partial_with_foreign_id_fails() {
    let fx = setup().await;
    let err = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::partial(ids(&["a", "zzz"])))
        .await
        .unwrap_err();
    assert!(matches!(err, UnmergeError::InvalidRequest { ref reason } if reason.contains("zzz")));
    assert_eq!(fx.archive.calls(), 0);
}

// ── Preconditions ────────────────────────────────────────────────

#[tokio::test]
async fn unknown_golden_record_is_not_found() {
    let fx = setup().await;
    let err = fx
        .executor
        .unmerge(&UnmergeRequest::new("ghost", "auditor"), &UnmergeOptions::full())
        .await
        .unwrap_err();
    assert!(matches!(err, UnmergeError::ProvenanceNotFound { .. }));
    assert_eq!(err.code(), "PROVENANCE_NOT_FOUND");
}

#[tokio::test]
async fn second_unmerge_is_rejected() {
    let fx = setup().await;
    fx.executor
        .unmerge(&request(), &UnmergeOptions::partial(ids(&["a"])))
        .await
        .unwrap();

    let err = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::partial(ids(&["b"])))
        .await
        .unwrap_err();
    match err {
        UnmergeError::AlreadyUnmerged {
            unmerged_at,
            unmerged_by,
            ..
        } => {
            assert_eq!(unmerged_at, Some(t(10)));
            assert_eq!(unmerged_by.as_deref(), Some("auditor"));
        }
        other => panic!("expected AlreadyUnmerged, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_archive_entries_are_all_reported() {
    let fx = setup().await;
    fx.archive.inner.remove(&ids(&["a", "c"])).await.unwrap();

    let err = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::full())
        .await
        .unwrap_err();
    match err {
        UnmergeError::SourceRecordsNotFound { missing, .. } => {
            assert_eq!(missing, ids(&["a", "c"]));
        }
        other => panic!("expected SourceRecordsNotFound, got {other:?}"),
    }
    assert!(fx.persistence.log().is_empty());
    let p = fx.store.get(&RecordId::from("g1")).await.unwrap().unwrap();
    assert!(!p.unmerged);
}

#[tokio::test]
async fn restore_failure_leaves_archive_and_provenance_untouched() {
    let fx = setup_with(RecordingPersistence::failing_restore("b")).await;
    let err = fx
        .executor
        .unmerge(&request(), &UnmergeOptions::full())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UnmergeError::Callback {
            operation: "restore_record",
            ..
        }
    ));
    assert_eq!(err.code(), "CALLBACK_FAILED");
    assert_eq!(fx.archive.inner.len().await, 3);
    let p = fx.store.get(&RecordId::from("g1")).await.unwrap().unwrap();
    assert!(!p.unmerged);
    assert!(!fx.persistence.log().iter().any(|l| l.starts_with("delete:")));
}

// ── can_unmerge ──────────────────────────────────────────────────

#[tokio::test]
async fn can_unmerge_reports_ready_record() {
    let fx = setup().await;
    let check = fx.executor.can_unmerge(&RecordId::from("g1")).await.unwrap();
    assert!(check.can_unmerge);
    assert!(check.reason.is_none());
}

#[tokio::test]
async fn can_unmerge_is_false_after_unmerge() {
    let fx = setup().await;
    fx.executor
        .unmerge(&request(), &UnmergeOptions::partial(ids(&["a"])))
        .await
        .unwrap();

    let check = fx.executor.can_unmerge(&RecordId::from("g1")).await.unwrap();
    assert!(!check.can_unmerge);
    let reason = check.reason.unwrap();
    assert!(reason.contains("already unmerged"));
    assert!(reason.contains("auditor"));
}

#[tokio::test]
async fn can_unmerge_is_false_without_provenance() {
    let fx = setup().await;
    let check = fx.executor.can_unmerge(&RecordId::from("ghost")).await.unwrap();
    assert!(!check.can_unmerge);
}

#[tokio::test]
async fn can_unmerge_does_not_mutate() {
    let fx = setup().await;
    fx.archive.inner.remove(&ids(&["b"])).await.unwrap();

    let check = fx.executor.can_unmerge(&RecordId::from("g1")).await.unwrap();
    assert!(!check.can_unmerge);
    assert!(check.reason.unwrap().contains('b'));
    assert_eq!(fx.archive.inner.len().await, 2);
    assert!(!fx.store.get(&RecordId::from("g1")).await.unwrap().unwrap().unmerged);
}
