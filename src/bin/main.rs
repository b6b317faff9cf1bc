//! tablediff CLI — ad-hoc runner over JSON fixtures, loaded into
//! `MemoryDatabase` instances. Not a production front end: it exists to
//! exercise `DiffOrchestrator::diff_tables` the way a developer debugging a
//! run would.
//!
//! Usage:
//!   tablediff diff --left left.json --right right.json --key id
//!   tablediff diff --left a.json --right b.json --key id,region --threads 4 --algorithm hashdiff

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use tablediff::database::memory::MemoryDatabase;
use tablediff::database::{Database, Row, TablePath, Value};
use tablediff::orchestrator::{Algorithm, DiffOptions, DiffOrchestrator};
use tablediff::schema::{ColumnDescriptor, SemanticClass};
use tablediff::segment::{ComparisonSemantics, TableSegment};

#[derive(Parser)]
#[command(name = "tablediff")]
#[command(about = "Cross-database table comparison engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two table fixtures and print the difference stream.
    Diff {
        /// Path to the left-side fixture (JSON).
        #[arg(long)]
        left: PathBuf,

        /// Path to the right-side fixture (JSON).
        #[arg(long)]
        right: PathBuf,

        /// Comma-separated key column names.
        #[arg(long, value_delimiter = ',')]
        key: Vec<String>,

        /// Algorithm to use.
        #[arg(long, default_value = "auto")]
        algorithm: AlgorithmArg,

        /// Worker concurrency.
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
}

#[derive(Clone, ValueEnum)]
enum AlgorithmArg {
    Auto,
    Hashdiff,
    Joindiff,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Auto => Algorithm::Auto,
            AlgorithmArg::Hashdiff => Algorithm::HashDiff,
            AlgorithmArg::Joindiff => Algorithm::JoinDiff,
        }
    }
}

/// On-disk fixture format: a table's schema and rows as plain JSON.
#[derive(Deserialize)]
struct Fixture {
    table: String,
    columns: Vec<FixtureColumn>,
    key_columns: Vec<String>,
    #[serde(default)]
    unique_key_columns: Option<Vec<String>>,
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct FixtureColumn {
    name: String,
    raw_type: String,
    class: FixtureClass,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case", tag = "kind")]
enum FixtureClass {
    Integer,
    Decimal { precision: u8, scale: u8 },
    Float,
    Boolean,
    Text { case_sensitive: bool },
    Date,
    Timestamp { precision: u8, with_tz: bool },
    Binary,
    Json,
}

impl From<FixtureClass> for SemanticClass {
    fn from(class: FixtureClass) -> Self {
        match class {
            FixtureClass::Integer => SemanticClass::Integer,
            FixtureClass::Decimal { precision, scale } => SemanticClass::Decimal { precision, scale },
            FixtureClass::Float => SemanticClass::Float,
            FixtureClass::Boolean => SemanticClass::Boolean,
            FixtureClass::Text { case_sensitive } => SemanticClass::Text { case_sensitive },
            FixtureClass::Date => SemanticClass::Date,
            FixtureClass::Timestamp { precision, with_tz } => {
                SemanticClass::Timestamp { precision, with_tz }
            }
            FixtureClass::Binary => SemanticClass::Binary,
            FixtureClass::Json => SemanticClass::Json,
        }
    }
}

fn decode_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        anyhow::bail!("hex string `{s}` has odd length");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(anyhow::Error::from))
        .collect()
}

fn json_to_value(value: &serde_json::Value, class: &SemanticClass) -> anyhow::Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    Ok(match class {
        SemanticClass::Integer => Value::Int(
            value
                .as_i64()
                .ok_or_else(|| anyhow::anyhow!("expected integer, got {value}"))?,
        ),
        SemanticClass::Decimal { .. } => {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => anyhow::bail!("expected decimal (string or number), got {value}"),
            };
            Value::Decimal(text.parse()?)
        }
        SemanticClass::Float => Value::Float(
            value
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("expected float, got {value}"))?,
        ),
        SemanticClass::Boolean => Value::Bool(
            value
                .as_bool()
                .ok_or_else(|| anyhow::anyhow!("expected bool, got {value}"))?,
        ),
        SemanticClass::Text { .. } => Value::Text(
            value
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("expected string, got {value}"))?
                .to_string(),
        ),
        SemanticClass::Date => Value::Date(
            value
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("expected date string, got {value}"))?
                .parse()?,
        ),
        SemanticClass::Timestamp { .. } => Value::Timestamp(
            chrono::NaiveDateTime::parse_from_str(
                value
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("expected timestamp string, got {value}"))?,
                "%Y-%m-%d %H:%M:%S%.f",
            )?,
        ),
        SemanticClass::Binary => Value::Binary(decode_hex(
            value
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("expected hex string, got {value}"))?,
        )?),
        SemanticClass::Json => Value::Json(value.to_string()),
        SemanticClass::Unknown => anyhow::bail!("fixture columns cannot be Unknown"),
    })
}

fn load_fixture(path: &PathBuf) -> anyhow::Result<(TablePath, tablediff::schema::Schema, Vec<String>, Option<Vec<String>>, Vec<Row>)> {
    let text = std::fs::read_to_string(path)?;
    let fixture: Fixture = serde_json::from_str(&text)?;

    let schema: tablediff::schema::Schema = fixture
        .columns
        .iter()
        .map(|c| ColumnDescriptor::new(c.name.clone(), c.raw_type.clone(), c.class.clone().into()))
        .collect();

    let classes: Vec<SemanticClass> = fixture.columns.iter().map(|c| c.class.clone().into()).collect();
    let rows = fixture
        .rows
        .into_iter()
        .map(|cells| {
            let values: anyhow::Result<Vec<Value>> = cells
                .iter()
                .zip(&classes)
                .map(|(cell, class)| json_to_value(cell, class))
                .collect();
            values.map(Row)
        })
        .collect::<anyhow::Result<Vec<Row>>>()?;

    Ok((
        TablePath::new(fixture.table),
        schema,
        fixture.key_columns,
        fixture.unique_key_columns,
        rows,
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Diff {
            left,
            right,
            key,
            algorithm,
            threads,
        } => cmd_diff(left, right, key, algorithm.into(), threads).await,
    }
}

async fn cmd_diff(
    left_path: PathBuf,
    right_path: PathBuf,
    key_columns: Vec<String>,
    algorithm: Algorithm,
    threads: usize,
) -> ExitCode {
    let (left_table, left_schema, left_keys, left_unique, left_rows) = match load_fixture(&left_path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error loading '{}': {e}", left_path.display());
            return ExitCode::FAILURE;
        }
    };
    let (right_table, right_schema, _right_keys, right_unique, right_rows) =
        match load_fixture(&right_path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("error loading '{}': {e}", right_path.display());
                return ExitCode::FAILURE;
            }
        };

    let key_columns = if key_columns.is_empty() { left_keys } else { key_columns };

    let left_extra: Vec<String> = left_schema
        .names()
        .filter(|n| !key_columns.iter().any(|k| k == n))
        .map(str::to_string)
        .collect();
    let right_extra: Vec<String> = right_schema
        .names()
        .filter(|n| !key_columns.iter().any(|k| k == n))
        .map(str::to_string)
        .collect();

    let left_db: Arc<dyn Database> = match MemoryDatabase::new("left").with_table(
        left_table.clone(),
        left_schema,
        key_columns.clone(),
        left_rows,
        left_unique,
    ) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("error building left fixture: {e}");
            return ExitCode::FAILURE;
        }
    };
    let right_db: Arc<dyn Database> = match MemoryDatabase::new("right").with_table(
        right_table.clone(),
        right_schema,
        key_columns.clone(),
        right_rows,
        right_unique,
    ) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("error building right fixture: {e}");
            return ExitCode::FAILURE;
        }
    };

    let left_segment = match TableSegment::new(
        left_db,
        left_table,
        key_columns.clone(),
        None,
        left_extra,
        None,
        None,
        None,
        None,
        None,
        None,
        ComparisonSemantics::default(),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("invalid left segment: {e}");
            return ExitCode::FAILURE;
        }
    };
    let right_segment = match TableSegment::new(
        right_db,
        right_table,
        key_columns,
        None,
        right_extra,
        None,
        None,
        None,
        None,
        None,
        None,
        ComparisonSemantics::default(),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("invalid right segment: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = DiffOptions {
        algorithm,
        threads,
        ..DiffOptions::default()
    };

    let run = match DiffOrchestrator.diff_tables(left_segment, right_segment, options).await {
        Ok(run) => run,
        Err(e) => {
            eprintln!("diff failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (records, stats) = run.collect().await;
    for record in &records {
        println!("{record:?}");
    }
    eprintln!("--- {} difference(s), {:?} ---", records.len(), stats);

    ExitCode::SUCCESS
}
