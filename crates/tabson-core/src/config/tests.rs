//! Tests for ResultSetOptions

use super::*;
use pretty_assertions::assert_eq;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults() {
    let options = ResultSetOptions::default();
    assert_eq!(options.conversion_mode, ConversionMode::Relaxed);
    assert_eq!(options.metadata_strategy, MetadataStrategy::SchemaKnown);
    assert!(!options.sort_fields_alphabetically);
    assert_eq!(options.database, "");
}

#[test]
fn test_builder() {
    let options = ResultSetOptions::new()
        .strict()
        .with_strategy(MetadataStrategy::RowDerived)
        .with_database("sales")
        .sorted(true);
    assert_eq!(options.conversion_mode, ConversionMode::Strict);
    assert_eq!(options.metadata_strategy, MetadataStrategy::RowDerived);
    assert_eq!(options.database, "sales");
    assert!(options.sort_fields_alphabetically);
    assert_eq!(options.relaxed().conversion_mode, ConversionMode::Relaxed);
}

#[test]
fn test_from_toml() {
    let toml_str = r#"
        conversion_mode = "strict"
        metadata_strategy = "row_derived"
        database = "sales"
    "#;
    let options = ResultSetOptions::from_toml_str(toml_str).unwrap();
    assert_eq!(
        options,
        ResultSetOptions::new()
            .strict()
            .with_strategy(MetadataStrategy::RowDerived)
            .with_database("sales")
    );
}

#[test]
fn test_from_toml_partial_uses_defaults() {
    let options = ResultSetOptions::from_toml_str("sort_fields_alphabetically = true").unwrap();
    assert_eq!(options, ResultSetOptions::new().sorted(true));
}

#[test]
fn test_from_toml_rejects_unknown_mode() {
    let result = ResultSetOptions::from_toml_str(r#"conversion_mode = "lenient""#);
    assert!(matches!(result, Err(TabsonError::Configuration(_))));
}

#[test]
fn test_load_missing_file() {
    let err = ResultSetOptions::load("/nonexistent/tabson.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/tabson.toml"));
}

#[test]
fn test_from_params() {
    let options = ResultSetOptions::from_params(&params(&[
        ("conversionMode", "strict"),
        ("dialect", "mysql"),
        ("database", "test"),
    ]))
    .unwrap();
    assert_eq!(options.conversion_mode, ConversionMode::Strict);
    assert_eq!(options.metadata_strategy, MetadataStrategy::RowDerived);
    assert_eq!(options.database, "test");
}

#[test]
fn test_from_params_empty() {
    let options = ResultSetOptions::from_params(&HashMap::new()).unwrap();
    assert_eq!(options, ResultSetOptions::default());
}

#[test]
fn test_from_params_invalid() {
    assert!(ResultSetOptions::from_params(&params(&[("conversionMode", "loose")])).is_err());
    assert!(ResultSetOptions::from_params(&params(&[("dialect", "sqlite")])).is_err());
}
