use chrono::{TimeZone, Utc};
use goldrec_model::{
    CustomMerge, FieldType, MergeStrategy, Provenance, RecordSchema, SchemaField,
    StrategyRegistry, UnmergeInfo,
};
use goldrec_types::RecordId;
use serde_json::{Value, json};

fn provenance() -> Provenance {
    Provenance::new(
        RecordId::from("g1"),
        vec![RecordId::from("a"), RecordId::from("b")],
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        "alice",
    )
}

#[test]
fn new_provenance_is_merged() {
    let p = provenance();
    assert!(!p.unmerged);
    assert!(p.unmerged_at.is_none());
    assert!(p.contains_source(&RecordId::from("a")));
    assert!(!p.contains_source(&RecordId::from("z")));
}

#[test]
fn mark_unmerged_is_one_shot() {
    let mut p = provenance();
    let first = UnmergeInfo {
        unmerged_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        unmerged_by: "bob".into(),
        reason: Some("wrong person".into()),
    };
    assert!(p.mark_unmerged(&first));
    assert!(p.unmerged);
    assert_eq!(p.unmerged_by.as_deref(), Some("bob"));

    let second = UnmergeInfo {
        unmerged_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        unmerged_by: "carol".into(),
        reason: None,
    };
    assert!(!p.mark_unmerged(&second));
    assert_eq!(p.unmerged_by.as_deref(), Some("bob"));
    assert_eq!(p.reason.as_deref(), Some("wrong person"));
}

#[test]
fn provenance_serializes_camel_case() {
    let v = serde_json::to_value(provenance()).unwrap();
    assert_eq!(v["goldenRecordId"], "g1");
    assert_eq!(v["sourceRecordIds"], json!(["a", "b"]));
    assert_eq!(v["mergedBy"], "alice");
    assert_eq!(v["unmerged"], false);
    assert!(v.get("unmergedAt").is_none());
}

#[test]
fn schema_lookup() {
    let schema = RecordSchema::new(vec![
        SchemaField::text("name").required(),
        SchemaField::number("age"),
        SchemaField::json("address"),
    ]);
    assert!(schema.contains("name"));
    assert!(schema.field("name").unwrap().required);
    assert_eq!(schema.field("age").unwrap().field_type, FieldType::Number);
    assert!(!schema.contains("email"));
    assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["name", "age", "address"]);
}

#[test]
fn registry_resolves_closures_by_name() {
    let registry = StrategyRegistry::new()
        .with("first", |values: &[Value]| values.first().cloned().unwrap_or(Value::Null));
    assert!(registry.contains("first"));
    assert!(!registry.contains("second"));

    let strategy = registry.get("first").unwrap();
    assert_eq!(strategy.resolve("name", &[json!("x"), json!("y")]), json!("x"));
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first"]);
    assert_eq!(MergeStrategy::from_tag("custom"), Some(MergeStrategy::Custom));
}
