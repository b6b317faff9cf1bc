use std::sync::Arc;

use tablediff::database::memory::MemoryDatabase;
use tablediff::database::{Database, Row, TablePath, Value};
use tablediff::diff::hashdiff::HashDiffer;
use tablediff::diff::joindiff::JoinDiffer;
use tablediff::diff::DifferenceRecord;
use tablediff::error::DiffError;
use tablediff::schema::{ColumnDescriptor, SemanticClass, Schema};
use tablediff::segment::{ComparisonSemantics, TableSegment};

fn schema() -> Schema {
    vec![
        ColumnDescriptor::new("id", "bigint", SemanticClass::Integer),
        ColumnDescriptor::new("v", "text", SemanticClass::Text { case_sensitive: true }),
    ]
    .into_iter()
    .collect()
}

fn shared_db(left_rows: Vec<Row>, right_rows: Vec<Row>) -> Arc<dyn Database> {
    Arc::new(
        MemoryDatabase::new("shared")
            .with_table(
                TablePath::new("left_t"),
                schema(),
                vec!["id".into()],
                left_rows,
                Some(vec!["id".into()]),
            )
            .unwrap()
            .with_table(
                TablePath::new("right_t"),
                schema(),
                vec!["id".into()],
                right_rows,
                Some(vec!["id".into()]),
            )
            .unwrap(),
    )
}

async fn segment_on(db: &Arc<dyn Database>, table: &str) -> TableSegment {
    TableSegment::new(
        db.clone(),
        TablePath::new(table),
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
    .with_schema()
    .await
    .unwrap()
}

fn sorted(mut records: Vec<DifferenceRecord>) -> Vec<DifferenceRecord> {
    records.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    records
}

fn rows(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|i| Row(vec![Value::Int(i), Value::Text(format!("v{i}"))]))
        .collect()
}

#[tokio::test]
async fn identity_emits_no_differences() {
    let db = shared_db(rows(20), rows(20));
    let left = segment_on(&db, "left_t").await;
    let right = segment_on(&db, "right_t").await;

    let records = JoinDiffer.diff(&left, &right).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn reports_missing_and_changed_rows_on_both_sides() {
    let mut left_rows = rows(30);
    left_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n == 10));
    left_rows[5].0[1] = Value::Text("modified".into());

    let mut right_rows = rows(30);
    right_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n == 20));

    let db = shared_db(left_rows, right_rows);
    let left = segment_on(&db, "left_t").await;
    let right = segment_on(&db, "right_t").await;

    let records = JoinDiffer.diff(&left, &right).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnRight { key } if key.0[0] == tablediff::key::KeyValue::Int(10))));
    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnLeft { key } if key.0[0] == tablediff::key::KeyValue::Int(20))));
    assert!(records.iter().any(|r| matches!(r, DifferenceRecord::Changed { .. })));
}

#[tokio::test]
async fn rejects_segments_backed_by_different_databases() {
    let left_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("db-left")
            .with_table(TablePath::new("left_t"), schema(), vec!["id".into()], rows(5), Some(vec!["id".into()]))
            .unwrap(),
    );
    let right_db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("db-right")
            .with_table(TablePath::new("right_t"), schema(), vec!["id".into()], rows(5), Some(vec!["id".into()]))
            .unwrap(),
    );
    let left = segment_on(&left_db, "left_t").await;
    let right = segment_on(&right_db, "right_t").await;

    let err = JoinDiffer.diff(&left, &right).await.unwrap_err();
    assert!(matches!(err, DiffError::Internal(_)));
}

#[tokio::test]
async fn rejects_non_unique_keys_on_either_side() {
    let db: Arc<dyn Database> = Arc::new(
        MemoryDatabase::new("shared")
            .with_table(TablePath::new("left_t"), schema(), vec!["id".into()], rows(5), None)
            .unwrap()
            .with_table(
                TablePath::new("right_t"),
                schema(),
                vec!["id".into()],
                rows(5),
                Some(vec!["id".into()]),
            )
            .unwrap(),
    );
    let left = segment_on(&db, "left_t").await;
    let right = segment_on(&db, "right_t").await;

    let err = JoinDiffer.diff(&left, &right).await.unwrap_err();
    assert!(matches!(err, DiffError::Validation(_)));
}

#[tokio::test]
async fn algorithm_equivalence_join_and_hash_diff_agree_on_the_same_backend() {
    let mut left_rows = rows(120);
    left_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n % 9 == 0));
    left_rows[3].0[1] = Value::Text("divergent".into());

    let mut right_rows = rows(120);
    right_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n % 17 == 0));

    let db = shared_db(left_rows, right_rows);
    let left = segment_on(&db, "left_t").await;
    let right = segment_on(&db, "right_t").await;

    let join_records = sorted(JoinDiffer.diff(&left, &right).await.unwrap());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let hash_differ = HashDiffer {
        bisection_factor: 4,
        bisection_threshold: 8,
        max_concurrency: 4,
    };
    hash_differ
        .diff(&left, &right, tx, tablediff::stats::RunStats::new())
        .await
        .unwrap();
    let mut hash_records = Vec::new();
    while let Ok(r) = rx.try_recv() {
        hash_records.push(r);
    }
    let hash_records = sorted(hash_records);

    assert_eq!(join_records, hash_records);
}
