use goldrec_model::{
    ConflictResolution, FieldMergeConfig, MergeConfig, MergeStrategy, NullHandling,
    StrategyOptions,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn parses_camel_case_config() {
    let config = MergeConfig::from_value(json!({
        "defaultStrategy": "preferFirst",
        "fieldStrategies": [
            {"field": "name", "strategy": "preferNewer"},
            {"field": "notes", "strategy": "concatenate",
             "options": {"separator": "; ", "removeDuplicates": true, "nullHandling": "include"}},
            {"field": "score", "strategy": "custom", "customMerge": "weighted"}
        ],
        "conflictResolution": "markConflict",
        "timestampField": "updatedAt"
    }))
    .unwrap();

    assert_eq!(config.default_strategy, MergeStrategy::PreferFirst);
    assert_eq!(config.conflict_resolution, ConflictResolution::MarkConflict);
    assert!(config.track_provenance);
    assert_eq!(config.timestamp_field.as_deref(), Some("updatedAt"));
    assert_eq!(config.field_strategies.len(), 3);

    let notes = config.field_config("notes").unwrap();
    let options = notes.options.clone().unwrap();
    assert_eq!(options.separator(), "; ");
    assert!(options.remove_duplicates());
    assert_eq!(options.null_handling(), NullHandling::Include);

    assert_eq!(
        config.field_config("score").unwrap().custom_merge.as_deref(),
        Some("weighted")
    );
}

#[test]
fn unknown_strategy_is_rejected_by_parser() {
    let err = MergeConfig::from_json_str(r#"{"defaultStrategy": "coinFlip"}"#).unwrap_err();
    assert!(err.to_string().contains("coinFlip"));
}

#[test]
fn missing_default_strategy_is_rejected_by_parser() {
    assert!(MergeConfig::from_json_str(r#"{"fieldStrategies": []}"#).is_err());
}

#[test]
fn wrongly_typed_option_is_rejected_by_parser() {
    let result = MergeConfig::from_value(json!({
        "defaultStrategy": "preferFirst",
        "fieldStrategies": [
            {"field": "notes", "strategy": "concatenate", "options": {"removeDuplicates": "yes"}}
        ]
    }));
    assert!(result.is_err());
}

#[test]
fn strategy_for_falls_back_to_default() {
    let config = MergeConfig::with_default(MergeStrategy::PreferLast)
        .with_field(FieldMergeConfig::new("age", MergeStrategy::Max));
    assert_eq!(config.strategy_for("age"), MergeStrategy::Max);
    assert_eq!(config.strategy_for("name"), MergeStrategy::PreferLast);
}

#[test]
fn default_config() {
    let config = MergeConfig::default();
    assert_eq!(config.default_strategy, MergeStrategy::PreferNonNull);
    assert_eq!(config.conflict_resolution, ConflictResolution::UseDefault);
    assert!(config.track_provenance);
    assert!(config.field_strategies.is_empty());
}

#[test]
fn strategy_tags_round_trip() {
    for strategy in MergeStrategy::ALL {
        assert_eq!(MergeStrategy::from_tag(strategy.as_str()), Some(strategy));
        let encoded = serde_json::to_value(strategy).unwrap();
        assert_eq!(encoded, json!(strategy.as_str()));
    }
    assert_eq!(MergeStrategy::from_tag("nope"), None);
}

#[test]
fn numeric_strategies() {
    let numeric: Vec<_> = MergeStrategy::ALL
        .into_iter()
        .filter(MergeStrategy::is_numeric)
        .collect();
    assert_eq!(
        numeric,
        vec![
            MergeStrategy::Max,
            MergeStrategy::Min,
            MergeStrategy::Sum,
            MergeStrategy::Avg
        ]
    );
}

#[test]
fn options_defaults() {
    let options = StrategyOptions::default();
    assert_eq!(options.separator(), " ");
    assert!(!options.remove_duplicates());
    assert_eq!(options.null_handling(), NullHandling::Skip);
}

#[test]
fn config_serializes_back_to_camel_case() {
    let config = MergeConfig::with_default(MergeStrategy::PreferFirst)
        .with_field(FieldMergeConfig::custom("score", "weighted"))
        .with_conflict_resolution(ConflictResolution::Error);
    let v = serde_json::to_value(&config).unwrap();
    assert_eq!(v["defaultStrategy"], "preferFirst");
    assert_eq!(v["conflictResolution"], "error");
    assert_eq!(v["fieldStrategies"][0]["customMerge"], "weighted");
    assert_eq!(MergeConfig::from_value(v).unwrap(), config);
}
