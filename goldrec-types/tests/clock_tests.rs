use chrono::{DateTime, Duration, Utc};
use goldrec_types::{Clock, FixedClock, SourceRecord, SystemClock, parse_timestamp};
use serde_json::json;

fn t(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn fixed_clock_is_frozen_until_advanced() {
    let clock = FixedClock::new(t("2024-01-01T00:00:00Z"));
    assert_eq!(clock.now(), clock.now());
    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now(), t("2024-01-01T00:01:30Z"));
    clock.set(t("2025-06-01T12:00:00Z"));
    assert_eq!(clock.now(), t("2025-06-01T12:00:00Z"));
}

#[test]
fn system_clock_moves_forward() {
    let a = SystemClock.now();
    let b = SystemClock.now();
    assert!(b >= a);
}

#[test]
fn parse_timestamp_accepts_rfc3339_and_millis() {
    assert_eq!(
        parse_timestamp(&json!("2024-03-01T10:00:00+01:00")),
        Some(t("2024-03-01T09:00:00Z"))
    );
    assert_eq!(
        parse_timestamp(&json!(0)),
        Some(t("1970-01-01T00:00:00Z"))
    );
    assert_eq!(parse_timestamp(&json!("yesterday")), None);
    assert_eq!(parse_timestamp(&json!(true)), None);
}

#[test]
fn source_record_serializes_camel_case() {
    let rec = SourceRecord::at("a", json!({"name": "Jon"}), t("2024-01-01T00:00:00Z"));
    let v = serde_json::to_value(&rec).unwrap();
    assert_eq!(v["id"], "a");
    assert_eq!(v["record"]["name"], "Jon");
    assert!(v.get("createdAt").is_some());
    assert!(v.get("updatedAt").is_some());
}
