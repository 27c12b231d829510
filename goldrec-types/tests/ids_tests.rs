use goldrec_types::{Error, QueueItemId, RecordId, derive_record_id};
use serde_json::json;

#[test]
fn record_id_rejects_blank() {
    assert!(matches!(RecordId::try_new(""), Err(Error::EmptyId)));
    assert!(RecordId::try_new("   ").is_err());
    assert_eq!(RecordId::try_new("a").unwrap().as_str(), "a");
}

#[test]
fn numeric_ids_coerce_to_string() {
    assert_eq!(RecordId::from(42u64).as_str(), "42");
    assert_eq!(RecordId::from(-7i64).as_str(), "-7");
}

#[test]
fn record_id_serializes_transparently() {
    let id = RecordId::from("rec-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""rec-1""#);
    let back: RecordId = serde_json::from_str(r#""rec-1""#).unwrap();
    assert_eq!(back, id);
}

#[test]
fn derive_from_string_and_number() {
    assert_eq!(
        derive_record_id(&json!({"id": "c1"}), "id"),
        Some(RecordId::from("c1"))
    );
    assert_eq!(
        derive_record_id(&json!({"id": 17}), "id"),
        Some(RecordId::from("17"))
    );
    assert_eq!(
        derive_record_id(&json!({"meta": {"key": "k"}}), "meta.key"),
        Some(RecordId::from("k"))
    );
}

#[test]
fn derive_rejects_missing_blank_and_other_shapes() {
    assert_eq!(derive_record_id(&json!({}), "id"), None);
    assert_eq!(derive_record_id(&json!({"id": ""}), "id"), None);
    assert_eq!(derive_record_id(&json!({"id": 1.5}), "id"), None);
    assert_eq!(derive_record_id(&json!({"id": {"x": 1}}), "id"), None);
}

#[test]
fn queue_item_ids_are_unique() {
    let a = QueueItemId::new();
    let b = QueueItemId::new();
    assert_ne!(a, b);
}
