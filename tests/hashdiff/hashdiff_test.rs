use std::sync::Arc;

use tablediff::database::memory::MemoryDatabase;
use tablediff::database::{Database, Row, TablePath, Value};
use tablediff::diff::hashdiff::HashDiffer;
use tablediff::diff::DifferenceRecord;
use tablediff::key::KeyValue;
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

fn db_with(rows: Vec<Row>) -> Arc<dyn Database> {
    Arc::new(
        MemoryDatabase::new("m")
            .with_table(TablePath::new("t"), schema(), vec!["id".into()], rows, None)
            .unwrap(),
    )
}

fn segment_for(db: &Arc<dyn Database>) -> TableSegment {
    TableSegment::new(
        db.clone(),
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

async fn run(differ: &HashDiffer, left: &TableSegment, right: &TableSegment) -> Vec<DifferenceRecord> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    differ
        .diff(left, right, tx, tablediff::stats::RunStats::new())
        .await
        .unwrap();
    let mut out = Vec::new();
    while let Ok(r) = rx.try_recv() {
        out.push(r);
    }
    out
}

fn sorted_keys(records: &[DifferenceRecord]) -> Vec<i64> {
    let mut keys: Vec<i64> = records
        .iter()
        .map(|r| match &r.key().0[0] {
            KeyValue::Int(n) => *n,
            other => panic!("expected Int key, got {other:?}"),
        })
        .collect();
    keys.sort_unstable();
    keys
}

fn rows(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|i| Row(vec![Value::Int(i), Value::Text(format!("v{i}"))]))
        .collect()
}

#[tokio::test]
async fn identity_emits_no_differences_for_a_large_table() {
    let db = db_with(rows(500));
    let left = segment_for(&db).with_schema().await.unwrap();
    let right = segment_for(&db).with_schema().await.unwrap();

    let differ = HashDiffer {
        bisection_factor: 4,
        bisection_threshold: 32,
        max_concurrency: 4,
    };
    let records = run(&differ, &left, &right).await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn symmetry_swaps_missing_on_left_and_right() {
    let mut left_rows = rows(200);
    left_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n % 7 == 0));
    let mut right_rows = rows(200);
    right_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n % 11 == 0));

    let left_db = db_with(left_rows);
    let right_db = db_with(right_rows);
    let left = segment_for(&left_db).with_schema().await.unwrap();
    let right = segment_for(&right_db).with_schema().await.unwrap();

    let differ = HashDiffer {
        bisection_factor: 4,
        bisection_threshold: 16,
        max_concurrency: 4,
    };

    let forward = run(&differ, &left, &right).await;
    let backward = run(&differ, &right, &left).await;

    let forward_missing_right = sorted_keys(
        &forward
            .iter()
            .filter(|r| matches!(r, DifferenceRecord::MissingOnRight { .. }))
            .cloned()
            .collect::<Vec<_>>(),
    );
    let backward_missing_left = sorted_keys(
        &backward
            .iter()
            .filter(|r| matches!(r, DifferenceRecord::MissingOnLeft { .. }))
            .cloned()
            .collect::<Vec<_>>(),
    );
    assert_eq!(forward_missing_right, backward_missing_left);

    let forward_missing_left = sorted_keys(
        &forward
            .iter()
            .filter(|r| matches!(r, DifferenceRecord::MissingOnLeft { .. }))
            .cloned()
            .collect::<Vec<_>>(),
    );
    let backward_missing_right = sorted_keys(
        &backward
            .iter()
            .filter(|r| matches!(r, DifferenceRecord::MissingOnRight { .. }))
            .cloned()
            .collect::<Vec<_>>(),
    );
    assert_eq!(forward_missing_left, backward_missing_right);
}

#[tokio::test]
async fn completeness_reports_every_key_with_a_real_difference_exactly_once() {
    let mut left_rows = rows(150);
    // Change the value at a key present on both sides.
    left_rows[40].0[1] = Value::Text("changed".into());

    let mut right_rows = rows(150);
    right_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n == 100));
    right_rows.push(Row(vec![Value::Int(500), Value::Text("extra".into())]));

    let left_db = db_with(left_rows);
    let right_db = db_with(right_rows);
    let left = segment_for(&left_db).with_schema().await.unwrap();
    let right = segment_for(&right_db).with_schema().await.unwrap();

    let differ = HashDiffer {
        bisection_factor: 4,
        bisection_threshold: 16,
        max_concurrency: 4,
    };
    let records = run(&differ, &left, &right).await;

    let mut seen = std::collections::HashSet::new();
    for record in &records {
        assert!(seen.insert(record.key().clone()), "key reported more than once: {:?}", record.key());
    }

    let changed: Vec<_> = records
        .iter()
        .filter(|r| matches!(r, DifferenceRecord::Changed { .. }))
        .collect();
    assert_eq!(changed.len(), 1);
    assert!(matches!(changed[0].key().0[0], KeyValue::Int(41)));

    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnLeft { key } if key.0[0] == KeyValue::Int(500))));
    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnRight { key } if key.0[0] == KeyValue::Int(100))));
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn partition_invariance_holds_across_bisection_factors_and_thresholds() {
    let mut left_rows = rows(300);
    left_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n % 13 == 0));
    left_rows[10].0[1] = Value::Text("divergent".into());

    let right_rows = rows(300);

    let left_db = db_with(left_rows);
    let right_db = db_with(right_rows);

    let configs = [(2usize, 8u64), (4, 32), (16, 1), (32, 16384)];
    let mut baseline: Option<Vec<DifferenceRecord>> = None;

    for (factor, threshold) in configs {
        let left = segment_for(&left_db).with_schema().await.unwrap();
        let right = segment_for(&right_db).with_schema().await.unwrap();
        let differ = HashDiffer {
            bisection_factor: factor,
            bisection_threshold: threshold,
            max_concurrency: 4,
        };
        let mut records = run(&differ, &left, &right).await;
        records.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

        if let Some(expected) = &baseline {
            assert_eq!(&records, expected, "mismatch at factor={factor} threshold={threshold}");
        } else {
            baseline = Some(records);
        }
    }
}

#[tokio::test]
async fn bisection_recurses_at_least_one_level_and_still_finds_every_difference() {
    // A small threshold relative to the row count forces at least one round
    // of checkpoint splitting rather than falling straight to the leaf path.
    let mut left_rows = rows(64);
    left_rows.retain(|r| !matches!(r.0[0], Value::Int(n) if n == 1 || n == 64));

    let right_rows = rows(64);

    let left_db = db_with(left_rows);
    let right_db = db_with(right_rows);
    let left = segment_for(&left_db).with_schema().await.unwrap();
    let right = segment_for(&right_db).with_schema().await.unwrap();

    let differ = HashDiffer {
        bisection_factor: 4,
        bisection_threshold: 8,
        max_concurrency: 4,
    };
    let records = run(&differ, &left, &right).await;

    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnLeft { key } if key.0[0] == KeyValue::Int(1))));
    assert!(records
        .iter()
        .any(|r| matches!(r, DifferenceRecord::MissingOnLeft { key } if key.0[0] == KeyValue::Int(64))));
}
