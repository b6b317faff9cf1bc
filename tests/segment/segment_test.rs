use std::sync::Arc;

use tablediff::database::memory::MemoryDatabase;
use tablediff::database::{Database, Row, TablePath, Value};
use tablediff::error::DiffError;
use tablediff::key::{KeyValue, Vector};
use tablediff::schema::{ColumnDescriptor, SemanticClass};
use tablediff::segment::{ComparisonSemantics, TableSegment};

fn schema() -> tablediff::schema::Schema {
    vec![
        ColumnDescriptor::new("id", "bigint", SemanticClass::Integer),
        ColumnDescriptor::new("v", "text", SemanticClass::Text { case_sensitive: true }),
    ]
    .into_iter()
    .collect()
}

fn db() -> Arc<dyn Database> {
    Arc::new(
        MemoryDatabase::new("t")
            .with_table(
                TablePath::new("t"),
                schema(),
                vec!["id".into()],
                vec![
                    Row(vec![Value::Int(1), Value::Text("a".into())]),
                    Row(vec![Value::Int(2), Value::Text("b".into())]),
                    Row(vec![Value::Int(3), Value::Text("c".into())]),
                ],
                Some(vec!["id".into()]),
            )
            .unwrap(),
    )
}

fn segment() -> TableSegment {
    TableSegment::new(
        db(),
        TablePath::new("t"),
        vec!["id".into()],
        None,
        vec!["v".into()],
        None,
        None,
        None,
        None,
        None,
        None,
        ComparisonSemantics::default(),
    )
    .unwrap()
}

#[test]
fn rejects_update_bounds_without_an_update_column() {
    let err = TableSegment::new(
        db(),
        TablePath::new("t"),
        vec!["id".into()],
        None,
        vec!["v".into()],
        None,
        None,
        Some(Value::Int(1)),
        None,
        None,
        None,
        ComparisonSemantics::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}

#[test]
fn rejects_inverted_key_bounds() {
    let err = TableSegment::new(
        db(),
        TablePath::new("t"),
        vec!["id".into()],
        None,
        vec!["v".into()],
        Some(Vector::new(vec![KeyValue::Int(10)])),
        Some(Vector::new(vec![KeyValue::Int(1)])),
        None,
        None,
        None,
        None,
        ComparisonSemantics::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}

#[tokio::test]
async fn with_schema_resolves_column_types() {
    let bound = segment().with_schema().await.unwrap();
    let schema = bound.schema().unwrap();
    assert_eq!(schema.get("id").unwrap().class, SemanticClass::Integer);
}

#[tokio::test]
async fn with_schema_rejects_unknown_columns() {
    let missing = TableSegment::new(
        db(),
        TablePath::new("t"),
        vec!["id".into()],
        None,
        vec!["nonexistent".into()],
        None,
        None,
        None,
        None,
        None,
        None,
        ComparisonSemantics::default(),
    )
    .unwrap();
    let err = missing.with_schema().await.unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}

#[tokio::test]
async fn count_matches_the_full_table_when_unbounded() {
    let bound = segment().with_schema().await.unwrap();
    assert_eq!(bound.count().await.unwrap(), 3);
}

#[tokio::test]
async fn checkpoints_split_the_table_into_child_segments_spanning_the_full_range() {
    let bound = segment().with_schema().await.unwrap();
    let (min, max) = bound.query_key_range().await.unwrap().unwrap();
    let checkpoints = bound.choose_checkpoints(2, (&min, &max)).unwrap();
    let children = bound.segment_by_checkpoints(&checkpoints).unwrap();

    // The outermost edges inherit the parent's own (unbounded) min_key/max_key
    // rather than the observed min/max, so the row sitting exactly on the
    // true max isn't excluded by the exclusive-upper-bound check.
    assert_eq!(children[0].min_key, bound.min_key);
    assert_eq!(children.last().unwrap().max_key, bound.max_key);

    let mut total = 0;
    for child in &children {
        total += child.count().await.unwrap();
    }
    assert_eq!(total, 3);
}
