//! In-process reference `Database` over owned row vectors.
//!
//! Plays the role the teacher's `Ansi` dialect plays for `sql::dialect`: a
//! fully working, deterministic implementation used only for tests and
//! documentation, never wired into a production backend registry. It never
//! renders or parses SQL — `SegmentQuery` is evaluated directly in Rust.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use md5::{Digest, Md5};

use super::{
    value_to_key_value, Database, JoinRow, QueryKind, QueryOutcome, RawColumnInfo, Row,
    SamplingSpec, SegmentQuery, TablePath, Value,
};
use crate::dialect::{Dialect, Generic, SamplingMethod};
use crate::error::{DiffError, DiffResult};
use crate::key::{KeyValue, Vector};
use crate::normalize::{self, NormalizeOptions};
use crate::schema::Schema;

struct Table {
    schema: Schema,
    key_columns: Vec<String>,
    unique_key_columns: Option<HashSet<String>>,
    /// Each row's key tuple, precomputed at insertion, alongside the full
    /// row in schema column order.
    rows: Vec<(Vector, Row)>,
}

/// In-memory `Database`. Construct with [`MemoryDatabase::new`] and
/// [`MemoryDatabase::with_table`], then treat as immutable.
pub struct MemoryDatabase {
    id: String,
    dialect: Generic,
    tables: HashMap<TablePath, Table>,
}

impl std::fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("id", &self.id)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MemoryDatabase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dialect: Generic,
            tables: HashMap::new(),
        }
    }

    /// Registers a table. `rows` must be in `schema` column order.
    /// `unique_key_columns`, when set, marks which column set is known
    /// unique — consulted by `has_unique_key` for JoinDiff eligibility.
    pub fn with_table(
        mut self,
        path: TablePath,
        schema: Schema,
        key_columns: Vec<String>,
        rows: Vec<Row>,
        unique_key_columns: Option<Vec<String>>,
    ) -> DiffResult<Self> {
        let key_indices: Vec<usize> = key_columns
            .iter()
            .map(|name| {
                schema
                    .column_index(name)
                    .ok_or_else(|| DiffError::validation(format!("key column `{name}` not in schema")))
            })
            .collect::<DiffResult<_>>()?;

        let mut stored_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let components: DiffResult<Vec<KeyValue>> = key_indices
                .iter()
                .map(|&idx| value_to_key_value(&row.0[idx]))
                .collect();
            stored_rows.push((Vector::new(components?), row));
        }
        stored_rows.sort_by(|a, b| compare_vectors(&a.0, &b.0));

        self.tables.insert(
            path,
            Table {
                schema,
                key_columns,
                unique_key_columns: unique_key_columns.map(|cols| cols.into_iter().collect()),
                rows: stored_rows,
            },
        );
        Ok(self)
    }

    fn table(&self, path: &TablePath) -> DiffResult<&Table> {
        self.tables
            .get(path)
            .ok_or_else(|| DiffError::validation(format!("no such table registered: {path}")))
    }
}

fn compare_vectors(a: &Vector, b: &Vector) -> std::cmp::Ordering {
    for (x, y) in a.0.iter().zip(b.0.iter()) {
        match x.partial_cmp(y) {
            Some(ord) if ord != std::cmp::Ordering::Equal => return ord,
            _ => continue,
        }
    }
    std::cmp::Ordering::Equal
}

fn in_bounds(key: &Vector, min: &Option<Vector>, max: &Option<Vector>) -> bool {
    if let Some(min) = min {
        if compare_vectors(key, min) == std::cmp::Ordering::Less {
            return false;
        }
    }
    if let Some(max) = max {
        if compare_vectors(key, max) != std::cmp::Ordering::Less {
            return false;
        }
    }
    true
}

/// FNV-1a over a key's component `Display` strings — deterministic and
/// stable across both sides of a run, as `sampling_clause`/`deterministic_sample_predicate`
/// require.
fn hash_key(key: &Vector) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for component in &key.0 {
        for byte in component.to_string().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash ^= 0xff;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn sample_retains(key: &Vector, spec: &SamplingSpec) -> DiffResult<bool> {
    let h = hash_key(key);
    match spec.method {
        SamplingMethod::Deterministic => {
            let modulus = spec
                .modulus
                .ok_or_else(|| DiffError::validation("deterministic sampling requires a modulus"))?;
            Ok(h % modulus == 0)
        }
        SamplingMethod::System | SamplingMethod::Bernoulli => {
            let percent = spec
                .percent
                .ok_or_else(|| DiffError::validation("system/bernoulli sampling requires a percent"))?;
            Ok((h % 1_000_000) as f64 / 10_000.0 < percent)
        }
    }
}

fn matching_rows<'a>(table: &'a Table, query: &SegmentQuery) -> DiffResult<Vec<&'a (Vector, Row)>> {
    if query.filter.is_some() {
        return Err(DiffError::validation(
            "MemoryDatabase cannot evaluate opaque SQL filter fragments",
        ));
    }

    let update_idx = query
        .update_column
        .as_ref()
        .map(|name| {
            table
                .schema
                .column_index(name)
                .ok_or_else(|| DiffError::validation(format!("update column `{name}` not in schema")))
        })
        .transpose()?;

    let mut out = Vec::new();
    for entry @ (key, row) in &table.rows {
        if !in_bounds(key, &query.min_key, &query.max_key) {
            continue;
        }
        if let Some(idx) = update_idx {
            let value = &row.0[idx];
            if let Some(min) = &query.update_min {
                if !value_ge(value, min) {
                    continue;
                }
            }
            if let Some(max) = &query.update_max {
                if !value_lt(value, max) {
                    continue;
                }
            }
        }
        if let Some(sampling) = &query.sampling {
            if !sample_retains(key, sampling)? {
                continue;
            }
        }
        out.push(entry);
    }
    Ok(out)
}

fn value_ge(a: &Value, b: &Value) -> bool {
    value_cmp(a, b).map(|o| o != std::cmp::Ordering::Less).unwrap_or(true)
}

fn value_lt(a: &Value, b: &Value) -> bool {
    value_cmp(a, b).map(|o| o == std::cmp::Ordering::Less).unwrap_or(true)
}

fn value_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Decimal(x), Value::Decimal(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.partial_cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.partial_cmp(y),
        _ => None,
    }
}

fn normalize_opts(query: &SegmentQuery) -> NormalizeOptions {
    NormalizeOptions {
        case_sensitive: query.case_sensitive,
        float_tolerance: query.float_tolerance,
        timestamp_precision: query.timestamp_precision,
        json_comparison_mode: query.json_comparison_mode,
    }
}

fn fingerprint(row: &Row, schema: &Schema, extra_columns: &[String], opts: &NormalizeOptions) -> String {
    extra_columns
        .iter()
        .map(|name| {
            let idx = schema.column_index(name).expect("extra column resolved against schema");
            let class = &schema.get(name).expect("resolved").class;
            normalize::normalize(&row.0[idx], class, opts)
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Low `checksum_bits` bits of `MD5(fingerprint)`, matching the convention
/// `Dialect::md5_as_int` uses: the first `checksum_bits/4` hex digits,
/// interpreted as a nonnegative integer.
fn md5_as_int(fingerprint: &str, checksum_bits: u32) -> u128 {
    let digest = Md5::digest(fingerprint.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    let digits = ((checksum_bits / 4).max(1) as usize).min(32);
    u128::from_str_radix(&hex[..digits], 16).unwrap_or(0)
}

#[async_trait]
impl Database for MemoryDatabase {
    fn identity(&self) -> &str {
        &self.id
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn describe_table(&self, path: &TablePath) -> DiffResult<Vec<(String, RawColumnInfo)>> {
        let table = self.table(path)?;
        Ok(table
            .schema
            .iter()
            .map(|d| {
                (
                    d.name.clone(),
                    RawColumnInfo {
                        raw_type: d.raw_type.clone(),
                        nullable: true,
                    },
                )
            })
            .collect())
    }

    async fn refine_column_types(
        &self,
        path: &TablePath,
        columns: &[(String, RawColumnInfo)],
        _filter: Option<&str>,
    ) -> DiffResult<Schema> {
        let table = self.table(path)?;
        columns
            .iter()
            .map(|(name, _)| {
                table
                    .schema
                    .get(name)
                    .cloned()
                    .ok_or_else(|| DiffError::validation(format!("unknown column `{name}`")))
            })
            .collect()
    }

    async fn has_unique_key(&self, path: &TablePath, key_columns: &[String]) -> DiffResult<bool> {
        let table = self.table(path)?;
        let Some(unique) = &table.unique_key_columns else {
            return Ok(false);
        };
        let requested: HashSet<String> = key_columns.iter().cloned().collect();
        Ok(*unique == requested)
    }

    async fn execute(&self, query: &SegmentQuery) -> DiffResult<QueryOutcome> {
        let table = self.table(&query.table)?;
        let rows = matching_rows(table, query)?;

        match query.kind {
            QueryKind::Count => Ok(QueryOutcome::Count(rows.len() as u64)),
            QueryKind::CountAndChecksum => {
                if rows.is_empty() {
                    return Ok(QueryOutcome::CountAndChecksum(0, None));
                }
                let opts = normalize_opts(query);
                let checksum_bits = self.dialect.checksum_bits();
                let mut total: u128 = 0;
                for (_, row) in &rows {
                    let fp = fingerprint(row, &table.schema, &query.extra_columns, &opts);
                    total = total.wrapping_add(md5_as_int(&fp, checksum_bits));
                }
                Ok(QueryOutcome::CountAndChecksum(rows.len() as u64, Some(total)))
            }
            QueryKind::KeyRange => {
                if rows.is_empty() {
                    return Ok(QueryOutcome::KeyRange(None));
                }
                let mut min = rows[0].0.clone();
                let mut max = rows[0].0.clone();
                for (key, _) in &rows {
                    if compare_vectors(key, &min) == std::cmp::Ordering::Less {
                        min = key.clone();
                    }
                    if compare_vectors(key, &max) == std::cmp::Ordering::Greater {
                        max = key.clone();
                    }
                }
                Ok(QueryOutcome::KeyRange(Some((min, max))))
            }
            QueryKind::Rows => {
                let mut out: Vec<(Vector, Row)> = rows
                    .iter()
                    .map(|(key, row)| {
                        let values = query
                            .extra_columns
                            .iter()
                            .map(|name| {
                                let idx = table.schema.column_index(name).expect("resolved");
                                row.0[idx].clone()
                            })
                            .collect();
                        (key.clone(), Row(values))
                    })
                    .collect();
                out.sort_by(|a, b| compare_vectors(&a.0, &b.0));
                Ok(QueryOutcome::Rows(out))
            }
        }
    }

    async fn execute_join(&self, left: &SegmentQuery, right: &SegmentQuery) -> DiffResult<Vec<JoinRow>> {
        let left_table = self.table(&left.table)?;
        let right_table = self.table(&right.table)?;
        let left_rows = matching_rows(left_table, left)?;
        let mut right_rows: Vec<&(Vector, Row)> = matching_rows(right_table, right)?;

        let mut out = Vec::new();
        for (key, row) in &left_rows {
            let left_row = Row(left
                .extra_columns
                .iter()
                .map(|name| row.0[left_table.schema.column_index(name).expect("resolved")].clone())
                .collect());
            let match_pos = right_rows
                .iter()
                .position(|(right_key, _)| compare_vectors(right_key, key) == std::cmp::Ordering::Equal);
            if let Some(pos) = match_pos {
                let (_, right_row) = right_rows.remove(pos);
                let right_values = Row(right
                    .extra_columns
                    .iter()
                    .map(|name| right_row.0[right_table.schema.column_index(name).expect("resolved")].clone())
                    .collect());
                out.push(JoinRow {
                    key: key.clone(),
                    left: Some(left_row),
                    right: Some(right_values),
                });
            } else {
                out.push(JoinRow {
                    key: key.clone(),
                    left: Some(left_row),
                    right: None,
                });
            }
        }
        for (key, row) in right_rows {
            let values = Row(right
                .extra_columns
                .iter()
                .map(|name| row.0[right_table.schema.column_index(name).expect("resolved")].clone())
                .collect());
            out.push(JoinRow {
                key: key.clone(),
                left: None,
                right: Some(values),
            });
        }
        Ok(out)
    }

    async fn close(&self) -> DiffResult<()> {
        Ok(())
    }
}
