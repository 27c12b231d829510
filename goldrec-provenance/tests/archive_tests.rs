use chrono::{TimeZone, Utc};
use goldrec_provenance::{InMemorySourceRecordArchive, SourceRecordArchive};
use goldrec_types::{RecordId, SourceRecord};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_record(id: &str, name: &str) -> SourceRecord {
    SourceRecord::at(
        id,
        json!({ "name": name }),
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    )
}

fn ids(raw: &[&str]) -> Vec<RecordId> {
    raw.iter().map(|s| RecordId::from(*s)).collect()
}

#[tokio::test]
async fn archive_get_remove_round_trip() {
    let archive = InMemorySourceRecordArchive::new();
    let records = vec![make_record("a", "Jon"), make_record("b", "John")];
    archive.archive(&records, &RecordId::from("g1")).await.unwrap();

    let exists = archive.exists(&ids(&["a", "b"])).await.unwrap();
    assert!(exists.values().all(|present| *present));

    let fetched = archive.get(&ids(&["a", "b"])).await.unwrap();
    assert_eq!(fetched, records);

    archive.remove(&ids(&["a", "b"])).await.unwrap();
    let exists = archive.exists(&ids(&["a", "b"])).await.unwrap();
    assert!(exists.values().all(|present| !*present));
    assert!(archive.is_empty().await);
}

#[tokio::test]
async fn get_follows_request_order_and_omits_missing() {
    let archive = InMemorySourceRecordArchive::new();
    archive
        .archive(
            &[make_record("a", "Jon"), make_record("b", "John")],
            &RecordId::from("g1"),
        )
        .await
        .unwrap();

    let fetched: Vec<_> = archive
        .get(&ids(&["b", "missing", "a"]))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(fetched, ids(&["b", "a"]));
}

#[tokio::test]
async fn exists_reports_every_requested_id() {
    let archive = InMemorySourceRecordArchive::new();
    archive
        .archive(&[make_record("a", "Jon")], &RecordId::from("g1"))
        .await
        .unwrap();

    let exists = archive.exists(&ids(&["a", "b"])).await.unwrap();
    assert_eq!(exists.len(), 2);
    assert_eq!(exists[&RecordId::from("a")], true);
    assert_eq!(exists[&RecordId::from("b")], false);
}

#[tokio::test]
async fn archiving_again_overwrites_snapshot() {
    let archive = InMemorySourceRecordArchive::new();
    archive
        .archive(&[make_record("a", "Jon")], &RecordId::from("g1"))
        .await
        .unwrap();
    archive
        .archive(&[make_record("a", "Jonathan")], &RecordId::from("g2"))
        .await
        .unwrap();

    let fetched = archive.get(&ids(&["a"])).await.unwrap();
    assert_eq!(fetched[0].record, json!({ "name": "Jonathan" }));
    assert_eq!(
        archive.golden_record_of(&RecordId::from("a")).await,
        Some(RecordId::from("g2"))
    );
    assert_eq!(archive.len().await, 1);
}

#[tokio::test]
async fn get_by_golden_record_filters_by_owner() {
    let archive = InMemorySourceRecordArchive::new();
    archive
        .archive(
            &[make_record("b", "John"), make_record("a", "Jon")],
            &RecordId::from("g1"),
        )
        .await
        .unwrap();
    archive
        .archive(&[make_record("c", "Ann")], &RecordId::from("g2"))
        .await
        .unwrap();

    let owned: Vec<_> = archive
        .get_by_golden_record(&RecordId::from("g1"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(owned, ids(&["a", "b"]));
}

#[tokio::test]
async fn removing_unknown_ids_is_a_no_op() {
    let archive = InMemorySourceRecordArchive::<serde_json::Value>::new();
    archive.remove(&ids(&["ghost"])).await.unwrap();
    assert!(archive.is_empty().await);
}
