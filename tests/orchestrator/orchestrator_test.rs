use std::sync::Arc;

use tablediff::database::memory::MemoryDatabase;
use tablediff::database::{Database, Row, TablePath, Value};
use tablediff::diff::DifferenceRecord;
use tablediff::error::DiffError;
use tablediff::orchestrator::{Algorithm, DiffOptions, DiffOrchestrator};
use tablediff::schema::{ColumnDescriptor, SemanticClass, Schema};
use tablediff::segment::{ComparisonSemantics, TableSegment};

fn schema() -> Schema {
    vec![
        ColumnDescriptor::new("id", "bigint", SemanticClass::Integer),
        ColumnDescriptor::new("v", "text", SemanticClass::Text { case_sensitive: true }),
        ColumnDescriptor::new("only_left", "text", SemanticClass::Text { case_sensitive: true }),
    ]
    .into_iter()
    .collect()
}

fn segment(db: Arc<dyn Database>, table: &str, extra_columns: Vec<String>) -> TableSegment {
    TableSegment::new(
        db,
        TablePath::new(table),
        vec!["id".into()],
        None,
        extra_columns,
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

fn rows(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|i| Row(vec![Value::Int(i), Value::Text(format!("v{i}")), Value::Text("unused".into())]))
        .collect()
}

#[tokio::test]
async fn auto_picks_hashdiff_for_separate_databases() {
    let left_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("left-backend")
            .with_table(TablePath::new("t"), schema(), vec!["id".into()], rows(10), None)
            .unwrap(),
    );
    let mut right_rows = rows(10);
    right_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n == 5));
    let right_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("right-backend")
            .with_table(TablePath::new("t"), schema(), vec!["id".into()], right_rows, None)
            .unwrap(),
    );

    let left = segment(left_db, "t", vec!["v".into()]);
    let right = segment(right_db, "t", vec!["v".into()]);

    let run = DiffOrchestrator
        .diff_tables(left, right, DiffOptions::default())
        .await
        .unwrap();
    let (records, snapshot) = run.collect().await;

    assert_eq!(records.len(), 1);
    assert!(matches!(records[0], DifferenceRecord::MissingOnRight { .. }));
    assert_eq!(snapshot.differences_found, 1);
}

#[tokio::test]
async fn intersects_extra_columns_and_warns_about_columns_unique_to_one_side() {
    let db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("shared")
            .with_table(TablePath::new("a"), schema(), vec!["id".into()], rows(3), Some(vec!["id".into()]))
            .unwrap()
            .with_table(TablePath::new("b"), schema(), vec!["id".into()], rows(3), Some(vec!["id".into()]))
            .unwrap(),
    );

    // Left carries `only_left`, which right doesn't request; it should be
    // excluded from comparison (not treated as a row difference) and
    // surfaced as a warning instead.
    let left = segment(db.clone(), "a", vec!["v".into(), "only_left".into()]);
    let right = segment(db.clone(), "b", vec!["v".into()]);

    let run = DiffOrchestrator
        .diff_tables(left, right, DiffOptions::default())
        .await
        .unwrap();
    let (records, snapshot) = run.collect().await;

    assert!(records.is_empty());
    assert_eq!(snapshot.warnings_emitted, 1);
}

#[tokio::test]
async fn explicit_algorithm_overrides_auto_selection() {
    let db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("shared")
            .with_table(TablePath::new("a"), schema(), vec!["id".into()], rows(5), Some(vec!["id".into()]))
            .unwrap()
            .with_table(TablePath::new("b"), schema(), vec!["id".into()], rows(5), Some(vec!["id".into()]))
            .unwrap(),
    );

    let left = segment(db.clone(), "a", vec!["v".into()]);
    let right = segment(db.clone(), "b", vec!["v".into()]);

    let mut options = DiffOptions::default();
    options.algorithm = Algorithm::HashDiff;
    options.bisection_threshold = 2;
    options.bisection_factor = 2;

    let run = DiffOrchestrator.diff_tables(left, right, options).await.unwrap();
    let (records, _snapshot) = run.collect().await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn rejects_joindiff_across_separate_databases() {
    let left_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("left-backend")
            .with_table(TablePath::new("t"), schema(), vec!["id".into()], rows(3), Some(vec!["id".into()]))
            .unwrap(),
    );
    let right_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("right-backend")
            .with_table(TablePath::new("t"), schema(), vec!["id".into()], rows(3), Some(vec!["id".into()]))
            .unwrap(),
    );

    let left = segment(left_db, "t", vec!["v".into()]);
    let right = segment(right_db, "t", vec!["v".into()]);

    let mut options = DiffOptions::default();
    options.algorithm = Algorithm::JoinDiff;

    let err = DiffOrchestrator.diff_tables(left, right, options).await.unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}

#[tokio::test]
async fn rejects_mismatched_key_arity() {
    let db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("x")
            .with_table(TablePath::new("a"), schema(), vec!["id".into()], vec![], Some(vec!["id".into()]))
            .unwrap(),
    );
    let left = segment(db.clone(), "a", vec!["v".into()]);
    let mut right = segment(db, "a", vec!["v".into()]);
    right.key_columns.push("extra".into());

    let err = DiffOrchestrator
        .diff_tables(left, right, DiffOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}
