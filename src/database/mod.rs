//! The `Database` capability: connection pool + query executor for one
//! backend, honoring its paired [`Dialect`](crate::dialect::Dialect).
//!
//! Real backend drivers render [`SegmentQuery`] to SQL text via their
//! `Dialect` before dispatching to the underlying client library — driver
//! bring-up itself is out of scope (spec.md §1). The one implementation
//! shipped in this crate, [`memory::MemoryDatabase`], never generates SQL at
//! all: it evaluates `SegmentQuery` directly against owned in-process rows,
//! the same way the teacher's `Ansi` dialect stands in for a real backend in
//! tests without ever touching a socket.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DiffResult;
use crate::key::Vector;
use crate::normalize::JsonComparisonMode;
use crate::schema::{ColumnDescriptor, Schema};

/// Fully qualified reference to a table, independent of backend quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TablePath {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table: String,
}

impl TablePath {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            table: table.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(c) = &self.catalog {
            parts.push(c.as_str());
        }
        if let Some(s) = &self.schema {
            parts.push(s.as_str());
        }
        parts.push(self.table.as_str());
        write!(f, "{}", parts.join("."))
    }
}

/// A single column value, typed to match [`crate::schema::SemanticClass`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Decimal(BigDecimal),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Binary(Vec<u8>),
    Json(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::Binary(b) => write!(f, "{}", b.iter().map(|x| format!("{x:02x}")).collect::<String>()),
            Value::Json(j) => write!(f, "{j}"),
        }
    }
}

/// A materialized row, positionally aligned to a [`Schema`]'s column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<Value>);

/// Raw catalog info for one column, before `Dialect::parse_type` resolves a
/// [`crate::schema::SemanticClass`].
#[derive(Debug, Clone)]
pub struct RawColumnInfo {
    pub raw_type: String,
    pub nullable: bool,
}

/// A sampling directive attached to a [`SegmentQuery`].
#[derive(Debug, Clone)]
pub struct SamplingSpec {
    pub method: crate::dialect::SamplingMethod,
    /// `TABLESAMPLE`/`SAMPLE` percent for `System`/`Bernoulli`; the modulus
    /// for `Deterministic`.
    pub percent: Option<f64>,
    pub modulus: Option<u64>,
}

/// What shape of result a [`SegmentQuery`] expects back. Spec.md §4.2 calls
/// this `shape` in `query(sql, shape) → rows`; here it is folded into the
/// query descriptor itself rather than passed as a side channel, since each
/// `TableSegment` operation has exactly one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Count,
    CountAndChecksum,
    KeyRange,
    /// Ordered-by-key row materialization, used at HashDiff leaves.
    Rows,
}

/// A structured description of one `TableSegment` operation: the contract
/// between `TableSegment`/the diff algorithms and a `Database` implementation.
/// Real backends render this to SQL via their `Dialect`; `MemoryDatabase`
/// evaluates it directly.
#[derive(Debug, Clone)]
pub struct SegmentQuery {
    pub table: TablePath,
    /// Resolved descriptors for every column the query touches, so a
    /// real `Dialect` can select the right `normalize_*` method per column
    /// and `MemoryDatabase` can normalize values without a side channel.
    pub schema: Schema,
    pub key_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub update_column: Option<String>,
    pub min_key: Option<Vector>,
    pub max_key: Option<Vector>,
    pub update_min: Option<Value>,
    pub update_max: Option<Value>,
    pub filter: Option<String>,
    pub sampling: Option<SamplingSpec>,
    /// Comparison semantics, propagated from `DiffOptions` down to the
    /// segment that owns a given query. Real dialects pass these straight
    /// through to `normalize_text`/`normalize_timestamp`/etc.
    pub case_sensitive: bool,
    pub float_tolerance: f64,
    pub timestamp_precision: u8,
    pub json_comparison_mode: JsonComparisonMode,
    pub kind: QueryKind,
}

/// The result of executing a [`SegmentQuery`], shaped per its `kind`.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Count(u64),
    /// `checksum` is `None` when `count == 0`, per spec.md §4.3.
    CountAndChecksum(u64, Option<u128>),
    KeyRange(Option<(Vector, Vector)>),
    Rows(Vec<(Vector, Row)>),
}

/// One row of a same-database full outer join, as produced by `JoinDiffer`
/// (spec.md §4.5). `left`/`right` are `None` when the key is missing on
/// that side.
#[derive(Debug, Clone)]
pub struct JoinRow {
    pub key: Vector,
    pub left: Option<Row>,
    pub right: Option<Row>,
}

/// Wraps a backend driver, honoring its paired `Dialect`.
///
/// Implementations must be safe for concurrent invocation from up to
/// `threads` callers; backends whose `Dialect::threading_model` reports
/// `SingleConnection` are responsible for serializing internally and
/// presenting a queued interface to callers — the trait itself imposes no
/// serialization.
#[async_trait]
pub trait Database: Send + Sync + fmt::Debug {
    /// Opaque identity used to decide JoinDiff eligibility: two segments can
    /// use the same-database fast path iff their databases report equal ids.
    fn identity(&self) -> &str;

    fn dialect(&self) -> &dyn crate::dialect::Dialect;

    /// Names and raw catalog type strings, preserved exactly; case folding
    /// is deferred to `Dialect`.
    async fn describe_table(&self, path: &TablePath) -> DiffResult<Vec<(String, RawColumnInfo)>>;

    /// Resolves raw catalog info into typed descriptors, issuing follow-up
    /// queries if the catalog's type strings are ambiguous (e.g. untyped
    /// decimal scale).
    async fn refine_column_types(
        &self,
        path: &TablePath,
        columns: &[(String, RawColumnInfo)],
        filter: Option<&str>,
    ) -> DiffResult<Schema>;

    /// Whether the key columns of `path` are known unique (primary key or
    /// unique constraint), when `supports_primary_key_uniqueness` is true.
    async fn has_unique_key(&self, path: &TablePath, key_columns: &[String]) -> DiffResult<bool>;

    async fn execute(&self, query: &SegmentQuery) -> DiffResult<QueryOutcome>;

    /// Same-database full outer join, used by `JoinDiffer`. Only ever called
    /// when `left.identity() == right.identity()`.
    async fn execute_join(&self, left: &SegmentQuery, right: &SegmentQuery) -> DiffResult<Vec<JoinRow>>;

    /// Idempotent pool shutdown.
    async fn close(&self) -> DiffResult<()>;
}

pub fn column_descriptor_from_raw(
    name: &str,
    raw: &RawColumnInfo,
    dialect: &dyn crate::dialect::Dialect,
) -> ColumnDescriptor {
    ColumnDescriptor::new(name, raw.raw_type.clone(), dialect.parse_type(&raw.raw_type))
}

/// Converts a materialized column value into a [`crate::key::KeyValue`] for
/// use as a key-space component. Text values are accepted only when they are
/// plain hex digests (e.g. a UUID with dashes stripped); anything else is a
/// validation error, per spec.md §3's restriction to ordered scalar domains.
pub fn value_to_key_value(value: &Value) -> DiffResult<crate::key::KeyValue> {
    use crate::error::DiffError;
    use crate::key::KeyValue;
    match value {
        Value::Int(i) => Ok(KeyValue::Int(*i)),
        Value::Decimal(d) => Ok(KeyValue::Decimal(d.clone())),
        Value::Text(s) => {
            let stripped: String = s.chars().filter(|c| *c != '-').collect();
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(KeyValue::Hex(stripped.to_lowercase()))
            } else {
                Err(DiffError::validation(format!(
                    "key value `{s}` is not an ordered scalar domain (int, decimal, or hex digest)"
                )))
            }
        }
        other => Err(DiffError::validation(format!(
            "key columns must be integer, decimal, or hex-digest valued; got {other}"
        ))),
    }
}
