//! A contiguous key-range slice of a table, the unit of recursion for
//! [`HashDiffer`](crate::diff::hashdiff::HashDiffer).
//!
//! Grounded on `table_segment.py`'s `TableSegment` dataclass: the same
//! fields, translated from an `attrs`-frozen dataclass with `__attrs_post_init__`
//! validation into a plain struct whose invariants are enforced by a
//! fallible constructor instead of a side-effecting `__post_init__`.

use std::sync::Arc;

use crate::database::{
    Database, QueryKind, QueryOutcome, SamplingSpec, SegmentQuery, TablePath, Value,
};
use crate::error::{DiffError, DiffResult};
use crate::key::{self, KeyValue, Vector};
use crate::normalize::JsonComparisonMode;
use crate::schema::Schema;

/// Comparison semantics a segment carries through every query it issues.
/// Cloned from `DiffOptions` at orchestration time.
#[derive(Debug, Clone)]
pub struct ComparisonSemantics {
    pub case_sensitive: bool,
    pub float_tolerance: f64,
    pub timestamp_precision: u8,
    pub json_comparison_mode: JsonComparisonMode,
}

impl Default for ComparisonSemantics {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            float_tolerance: 0.0,
            timestamp_precision: 6,
            json_comparison_mode: JsonComparisonMode::Strict,
        }
    }
}

/// A value object identifying a table + key-range + filter + selected
/// columns. Immutable; narrowing operations (`segment_by_checkpoints`)
/// return new instances rather than mutating in place.
#[derive(Clone)]
pub struct TableSegment {
    pub database: Arc<dyn Database>,
    pub table_path: TablePath,
    pub key_columns: Vec<String>,
    pub update_column: Option<String>,
    pub extra_columns: Vec<String>,
    pub min_key: Option<Vector>,
    pub max_key: Option<Vector>,
    pub min_update: Option<Value>,
    pub max_update: Option<Value>,
    pub filter: Option<String>,
    pub sampling: Option<SamplingSpec>,
    pub semantics: ComparisonSemantics,
    schema: Option<Schema>,
}

impl std::fmt::Debug for TableSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSegment")
            .field("table_path", &self.table_path)
            .field("key_columns", &self.key_columns)
            .field("min_key", &self.min_key)
            .field("max_key", &self.max_key)
            .finish()
    }
}

impl TableSegment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database: Arc<dyn Database>,
        table_path: TablePath,
        key_columns: Vec<String>,
        update_column: Option<String>,
        extra_columns: Vec<String>,
        min_key: Option<Vector>,
        max_key: Option<Vector>,
        min_update: Option<Value>,
        max_update: Option<Value>,
        filter: Option<String>,
        sampling: Option<SamplingSpec>,
        semantics: ComparisonSemantics,
    ) -> DiffResult<Self> {
        if update_column.is_none() && (min_update.is_some() || max_update.is_some()) {
            return Err(DiffError::validation(
                "min_update/max_update requires update_column to be set",
            ));
        }
        if let (Some(min), Some(max)) = (&min_key, &max_key) {
            key::validate_bounds(min, max)?;
        }
        Ok(Self {
            database,
            table_path,
            key_columns,
            update_column,
            extra_columns,
            min_key,
            max_key,
            min_update,
            max_update,
            filter,
            sampling,
            semantics,
            schema: None,
        })
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Queries the table schema from the database and returns a new
    /// instance bound to it. A no-op if a schema is already bound.
    #[tracing::instrument(skip(self), fields(table = %self.table_path))]
    pub async fn with_schema(&self) -> DiffResult<Self> {
        if self.schema.is_some() {
            return Ok(self.clone());
        }
        let raw = self.database.describe_table(&self.table_path).await?;

        let mut required: Vec<String> = self.key_columns.clone();
        required.extend(self.extra_columns.iter().cloned());
        if let Some(update_column) = &self.update_column {
            required.push(update_column.clone());
        }
        let raw_by_name: std::collections::HashMap<&str, _> =
            raw.iter().map(|(n, info)| (n.as_str(), info)).collect();
        let mut columns = Vec::with_capacity(required.len());
        for name in &required {
            let Some(info) = raw_by_name.get(name.as_str()) else {
                return Err(DiffError::validation(format!(
                    "column `{name}` not found in table `{}`",
                    self.table_path
                )));
            };
            columns.push((name.clone(), (*info).clone()));
        }

        let schema = self
            .database
            .refine_column_types(&self.table_path, &columns, self.filter.as_deref())
            .await?;

        let mut next = self.clone();
        next.schema = Some(schema);
        Ok(next)
    }

    fn require_schema(&self) -> DiffResult<&Schema> {
        self.schema
            .as_ref()
            .ok_or_else(|| DiffError::internal("TableSegment operation requires with_schema() first"))
    }

    /// Builds the structured query descriptor for one operation kind,
    /// without executing it. Used by `JoinDiffer`, which issues its own
    /// `execute_join` call rather than going through `count`/`get_values`.
    pub fn to_segment_query(&self, kind: QueryKind) -> DiffResult<SegmentQuery> {
        self.base_query(kind)
    }

    fn base_query(&self, kind: QueryKind) -> DiffResult<SegmentQuery> {
        let schema = self.require_schema()?.clone();
        Ok(SegmentQuery {
            table: self.table_path.clone(),
            schema,
            key_columns: self.key_columns.clone(),
            extra_columns: self.extra_columns.clone(),
            update_column: self.update_column.clone(),
            min_key: self.min_key.clone(),
            max_key: self.max_key.clone(),
            update_min: self.min_update.clone(),
            update_max: self.max_update.clone(),
            filter: self.filter.clone(),
            sampling: self.sampling.clone(),
            case_sensitive: self.semantics.case_sensitive,
            float_tolerance: self.semantics.float_tolerance,
            timestamp_precision: self.semantics.timestamp_precision,
            json_comparison_mode: self.semantics.json_comparison_mode,
            kind,
        })
    }

    #[tracing::instrument(skip(self), fields(table = %self.table_path))]
    pub async fn count(&self) -> DiffResult<u64> {
        let query = self.base_query(QueryKind::Count)?;
        match self.database.execute(&query).await? {
            QueryOutcome::Count(n) => Ok(n),
            other => Err(DiffError::internal(format!("expected Count, got {other:?}"))),
        }
    }

    /// Single round-trip returning row count and the checksum over the
    /// per-row fingerprint; `None` checksum when count is 0. Logs a warning
    /// if wall time exceeds `RECOMMENDED_CHECKSUM_DURATION_SECS`.
    #[tracing::instrument(skip(self), fields(table = %self.table_path))]
    pub async fn count_and_checksum(&self) -> DiffResult<(u64, Option<u128>)> {
        let query = self.base_query(QueryKind::CountAndChecksum)?;
        let started = std::time::Instant::now();
        let outcome = self.database.execute(&query).await?;
        let elapsed = started.elapsed();
        if elapsed.as_secs() > RECOMMENDED_CHECKSUM_DURATION_SECS {
            tracing::warn!(
                table = %self.table_path,
                elapsed_secs = elapsed.as_secs(),
                "count_and_checksum exceeded recommended duration"
            );
        }
        match outcome {
            QueryOutcome::CountAndChecksum(count, checksum) => Ok((count, checksum)),
            other => Err(DiffError::internal(format!(
                "expected CountAndChecksum, got {other:?}"
            ))),
        }
    }

    /// One query returning per-key-column min and max.
    #[tracing::instrument(skip(self), fields(table = %self.table_path))]
    pub async fn query_key_range(&self) -> DiffResult<Option<(Vector, Vector)>> {
        let query = self.base_query(QueryKind::KeyRange)?;
        match self.database.execute(&query).await? {
            QueryOutcome::KeyRange(range) => Ok(range),
            other => Err(DiffError::internal(format!("expected KeyRange, got {other:?}"))),
        }
    }

    /// Materializes normalized-string rows for the segment; used at the
    /// leaves of HashDiff.
    #[tracing::instrument(skip(self), fields(table = %self.table_path))]
    pub async fn get_values(&self) -> DiffResult<Vec<(Vector, crate::database::Row)>> {
        let query = self.base_query(QueryKind::Rows)?;
        match self.database.execute(&query).await? {
            QueryOutcome::Rows(rows) => Ok(rows),
            other => Err(DiffError::internal(format!("expected Rows, got {other:?}"))),
        }
    }

    /// Given resolved bounds, returns `n+1` checkpoints including endpoints,
    /// evenly spaced in the key domain. For composite keys, `n` is taken per
    /// dimension so the final mesh has approximately `n` boxes.
    pub fn choose_checkpoints(&self, n: usize, bounds: (&Vector, &Vector)) -> DiffResult<Vec<Vec<KeyValue>>> {
        key::split_compound_key_space(bounds.0, bounds.1, n)
    }

    /// Produces child segments each covering one mesh cell, with tightened
    /// `min_key`/`max_key`.
    ///
    /// Interior cells get exclusive-upper bounds straight from the mesh, but
    /// the first and last cell inherit this segment's own `min_key`/`max_key`
    /// rather than the mesh's outermost checkpoints. Those checkpoints are
    /// the *observed* min/max key, and `Database::execute` treats `max_key`
    /// as exclusive — reusing the observed max verbatim would silently drop
    /// the row actually holding it. Inheriting the parent's bound instead
    /// (often `None`, i.e. open) keeps the true endpoint reachable no matter
    /// how many bisection levels deep it is.
    pub fn segment_by_checkpoints(&self, checkpoints: &[Vec<KeyValue>]) -> DiffResult<Vec<TableSegment>> {
        let boxes = key::create_mesh_from_points(checkpoints)?;
        let last = boxes.len().saturating_sub(1);
        boxes
            .into_iter()
            .enumerate()
            .map(|(i, (min, max))| {
                let mut child = self.clone();
                child.min_key = if i == 0 { self.min_key.clone() } else { Some(min) };
                child.max_key = if i == last { self.max_key.clone() } else { Some(max) };
                Ok(child)
            })
            .collect()
    }

    /// The key-space volume of this segment's bounds, if both are known.
    pub fn approximate_size(&self) -> Option<u128> {
        match (&self.min_key, &self.max_key) {
            (Some(min), Some(max)) => key::approximate_size(min, max),
            _ => None,
        }
    }
}

const RECOMMENDED_CHECKSUM_DURATION_SECS: u64 = 20;
