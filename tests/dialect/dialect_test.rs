use tablediff::dialect::{BigQuery, ClickHouse, Dialect, Generic, MySql, Oracle, Postgres, SamplingMethod, Snowflake, Trino};
use tablediff::schema::SemanticClass;

fn all_dialects() -> Vec<Box<dyn Dialect>> {
    vec![
        Box::new(Postgres),
        Box::new(MySql),
        Box::new(Snowflake),
        Box::new(BigQuery),
        Box::new(ClickHouse),
        Box::new(Oracle),
        Box::new(Trino),
        Box::new(Generic),
    ]
}

#[test]
fn every_registered_dialect_quotes_identifiers_without_panicking() {
    for dialect in all_dialects() {
        let quoted = dialect.quote_identifier("my_column");
        assert!(quoted.contains("my_column"), "{}", dialect.name());
    }
}

#[test]
fn every_dialect_reports_a_nonzero_checksum_width() {
    for dialect in all_dialects() {
        assert!(dialect.checksum_bits() > 0 && dialect.checksum_bits() <= 128);
    }
}

#[test]
fn oracle_sample_clause_omits_the_tablesample_keyword() {
    let clause = Oracle.sampling_clause(SamplingMethod::System, 10.0).unwrap();
    assert!(!clause.to_uppercase().contains("TABLESAMPLE"));
    assert!(clause.to_uppercase().contains("SAMPLE"));
}

#[test]
fn mysql_has_no_native_tablesample_and_falls_back_to_probabilistic_filter() {
    let clause = MySql.sampling_clause(SamplingMethod::System, 25.0).unwrap();
    assert!(clause.to_uppercase().contains("RAND"));
}

#[test]
fn postgres_parses_uuid_as_case_insensitive_text() {
    match Postgres.parse_type("uuid") {
        SemanticClass::Text { case_sensitive } => assert!(!case_sensitive),
        other => panic!("expected Text, got {other:?}"),
    }
}

#[test]
fn bigquery_recognizes_its_native_integer_type_name() {
    assert_eq!(BigQuery.parse_type("int64"), SemanticClass::Integer);
}

#[test]
fn generic_dialect_uses_trait_defaults_for_sampling() {
    let clause = Generic.sampling_clause(SamplingMethod::Bernoulli, 5.0).unwrap();
    assert!(clause.to_uppercase().contains("TABLESAMPLE"));
}

#[test]
fn deterministic_sampling_has_no_percent_and_is_not_none() {
    for dialect in all_dialects() {
        let pred = dialect.deterministic_sample_predicate(&["id".to_string()], 7);
        assert!(pred.contains('7'), "{}", dialect.name());
    }
}
