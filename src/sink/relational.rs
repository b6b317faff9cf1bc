//! Extension point for a sink that writes the five-relation materialized
//! schema of spec.md §6. No concrete database-backed implementation ships
//! (writing to a live warehouse is connection/credential bring-up, out of
//! scope) — this defines the DDL and the trait a caller implements against
//! their own connection.

use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::DiffResult;

use super::ResultSink;

/// DDL for the five relations, rendered with a caller-supplied `Dialect`
/// for identifier quoting. Column types are left portable (`BIGINT`,
/// `TEXT`, `TIMESTAMP`) rather than backend-native, since this is a schema
/// definition for the *sink's own* storage, not a diffed table.
pub fn materialized_schema_ddl(dialect: &dyn Dialect) -> Vec<String> {
    let q = |name: &str| dialect.quote_identifier(name);
    vec![
        format!(
            "CREATE TABLE {} ({} UUID PRIMARY KEY, {} TEXT NOT NULL, {} TIMESTAMP NOT NULL, {} JSON NOT NULL)",
            q("diff_run_summary"),
            q("run_id"),
            q("table_pair"),
            q("started_at"),
            q("options_json"),
        ),
        format!(
            "CREATE TABLE {} ({} UUID NOT NULL REFERENCES {}({}), {} TEXT NOT NULL, {} TEXT NOT NULL, {} TEXT, {} TEXT, {} TEXT)",
            q("diff_difference_details"),
            q("run_id"),
            q("diff_run_summary"),
            q("run_id"),
            q("key_json"),
            q("kind"),
            q("column"),
            q("left_value"),
            q("right_value"),
        ),
        format!(
            "CREATE TABLE {} ({} UUID NOT NULL REFERENCES {}({}), {} TEXT NOT NULL, {} BIGINT NOT NULL, {} BIGINT NOT NULL)",
            q("diff_column_statistics"),
            q("run_id"),
            q("diff_run_summary"),
            q("run_id"),
            q("column"),
            q("differing_rows"),
            q("total_rows"),
        ),
        format!(
            "CREATE TABLE {} ({} UUID NOT NULL REFERENCES {}({}), {} TIMESTAMP NOT NULL, {} TIMESTAMP NOT NULL, {} BIGINT NOT NULL)",
            q("diff_timeline"),
            q("run_id"),
            q("diff_run_summary"),
            q("run_id"),
            q("period_start"),
            q("period_end"),
            q("diffs"),
        ),
        format!(
            "CREATE TABLE {} ({} UUID NOT NULL REFERENCES {}({}), {} BIGINT NOT NULL, {} BIGINT NOT NULL, {} BIGINT NOT NULL)",
            q("diff_performance_metrics"),
            q("run_id"),
            q("diff_run_summary"),
            q("run_id"),
            q("segments_expanded"),
            q("checksums_computed"),
            q("elapsed_ms"),
        ),
    ]
}

/// A `ResultSink` backed by a live relational store implementing the
/// materialized schema above. Callers supply the actual write path (e.g.
/// over their own connection pool); this crate only defines the contract
/// and the DDL.
#[async_trait]
pub trait RelationalSink: ResultSink {
    /// Issues the DDL above against the caller's connection, idempotently
    /// (e.g. `CREATE TABLE IF NOT EXISTS`).
    async fn ensure_schema(&mut self) -> DiffResult<()>;
}
