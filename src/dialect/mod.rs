//! Per-backend SQL rendering: identifier quoting, type mapping,
//! checksum/normalization expressions, sampling clauses.
//!
//! A [`Dialect`] is a pure rendering surface — no I/O. Concrete backends
//! ([`Postgres`], [`MySql`], [`Snowflake`], [`BigQuery`], [`ClickHouse`],
//! [`Oracle`], [`Trino`]) override only where they differ from the defaults;
//! [`Generic`] is a reference implementation used for tests and examples,
//! the same role `Ansi` plays in the teacher's `sql::dialect` module.

pub mod helpers;
mod bigquery;
mod clickhouse;
mod generic;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod trino;

pub use bigquery::BigQuery;
pub use clickhouse::ClickHouse;
pub use generic::Generic;
pub use mysql::MySql;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use snowflake::Snowflake;
pub use trino::Trino;

use crate::schema::SemanticClass;

/// Whether a backend serializes queries internally (one logical connection)
/// or can genuinely run concurrent queries from multiple workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingModel {
    Threaded,
    SingleConnection,
}

/// Sampling strategies a dialect may be asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMethod {
    System,
    Bernoulli,
    /// `WHERE (hash(key) MOD m) = 0`-style, identical on both sides of a run.
    Deterministic,
}

/// Per-backend SQL rendering surface. No I/O: every method is a pure
/// function from inputs to a SQL fragment (or semantic classification).
pub trait Dialect: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, ident: &str) -> String;

    /// Number of low-order bits of `MD5(x)` folded into the checksum
    /// accumulator. Must be identical on both sides of a run.
    fn checksum_bits(&self) -> u32 {
        128
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }

    fn supports_primary_key_uniqueness(&self) -> bool {
        true
    }

    fn supports_alphanumeric_keys(&self) -> bool {
        true
    }

    /// Map a backend type string to its semantic class. Defaults to the
    /// shared ANSI-ish mapping in [`helpers::parse_semantic_class`].
    fn parse_type(&self, raw: &str) -> SemanticClass {
        helpers::parse_semantic_class(raw)
    }

    /// Render `expr` as a canonical fixed-scale decimal string.
    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("CAST(ROUND(CAST({expr} AS DECIMAL(38,{scale})), {scale}) AS VARCHAR(64))")
    }

    /// Render `expr` as `YYYY-MM-DD HH:MM:SS.ffffff` truncated to `precision`
    /// fractional digits. `with_tz` signals the caller already normalized to
    /// UTC; dialects that cannot do so themselves simply trust the caller.
    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let _ = with_tz;
        let frac = "F".repeat(precision as usize);
        format!("TO_CHAR({expr}, 'YYYY-MM-DD HH24:MI:SS.{frac}')")
    }

    fn normalize_boolean(&self, expr: &str) -> String {
        format!("CASE WHEN {expr} THEN '1' ELSE '0' END")
    }

    fn normalize_text(&self, expr: &str, case_sensitive: bool) -> String {
        if case_sensitive {
            format!("CAST({expr} AS VARCHAR)")
        } else {
            format!("LOWER(CAST({expr} AS VARCHAR))")
        }
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("LOWER(CAST({expr} AS VARCHAR(36)))")
    }

    fn normalize_json(&self, expr: &str) -> String {
        format!("CAST({expr} AS VARCHAR)")
    }

    /// Low `checksum_bits()` bits of `MD5(expr)`, interpreted as a
    /// nonnegative integer.
    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1);
        format!(
            "CAST(CONV(SUBSTRING(MD5({expr}), {start}, {digits}), 16, 10) AS NUMERIC(38,0))",
            start = 33 - digits.min(32)
        )
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1);
        format!("SUBSTRING(MD5({expr}), {start}, {digits})", start = 33 - digits.min(32))
    }

    /// Null-safe concatenation of already-normalized column expressions
    /// into the per-row fingerprint input.
    fn concat(&self, exprs: &[String]) -> String {
        exprs.join(" || ")
    }

    /// Order-independent additive aggregate over `md5_as_int(...)` values.
    fn sum_checksum(&self, md5_int_expr: &str) -> String {
        format!("SUM({md5_int_expr})")
    }

    /// Render a `TABLESAMPLE`/`SAMPLE`/`WHERE RANDOM()<p`-style fragment to
    /// append after the segment's `FROM <table>` clause. Returns `None` when
    /// `method` is [`SamplingMethod::Deterministic`] — that case is rendered
    /// via [`Dialect::deterministic_sample_predicate`] instead, because it
    /// must be bit-identical across backends rather than backend-native.
    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System => Some(format!("TABLESAMPLE SYSTEM ({percent})")),
            SamplingMethod::Bernoulli => Some(format!("TABLESAMPLE BERNOULLI ({percent})")),
            SamplingMethod::Deterministic => None,
        }
    }

    /// A `WHERE`-clause predicate selecting the same key subset on every
    /// dialect that implements this method identically: `(hash(key) MOD m) = 0`.
    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        if key_columns.len() == 1 {
            let col = self.quote_identifier(&key_columns[0]);
            format!("(CAST({col} AS BIGINT) % {modulus}) = 0")
        } else {
            let concat = key_columns
                .iter()
                .map(|c| format!("CAST({} AS VARCHAR)", self.quote_identifier(c)))
                .collect::<Vec<_>>()
                .join(" || ");
            format!("(ABS(MOD(CAST({concat} AS BIGINT), {modulus}))) = 0")
        }
    }
}
