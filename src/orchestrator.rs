//! The single programmatic entry point, `diff_tables`, per spec.md §6.
//!
//! Grounded on the teacher's `worker::client::WorkerClient` for the
//! bounded-concurrency task-pool shape (`tokio::task::JoinSet` +
//! `tokio::sync::Semaphore`), generalized from a single embedded-provider
//! connection to the diff engine's two-sided segment comparison.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::diff::hashdiff::HashDiffer;
use crate::diff::joindiff::JoinDiffer;
use crate::diff::DifferenceRecord;
use crate::error::{DiffError, DiffResult};
use crate::normalize::JsonComparisonMode;
use crate::stats::{RunStats, RunStatsSnapshot};
use crate::segment::TableSegment;

/// Algorithm selection, per spec.md §6. `Auto` picks `JoinDiff` iff both
/// segments' databases report the same identity (spec.md §4.5), else
/// `HashDiff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Auto,
    HashDiff,
    JoinDiff,
}

/// Tunables for one run, the `options` parameter of `DiffTables`
/// (spec.md §6). Loadable from TOML the way the teacher's
/// `config::settings::Settings` loads `mantis.toml` (see `crate::config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub algorithm: Algorithm,
    pub bisection_factor: usize,
    pub bisection_threshold: u64,
    pub threads: usize,
    pub extra_columns: Option<Vec<String>>,
    pub float_tolerance: f64,
    pub case_sensitive: bool,
    pub strict_type_checking: bool,
    pub timestamp_precision: u8,
    pub json_comparison_mode: JsonComparisonMode,
    /// Wall-clock budget for the whole run; `None` means unbounded.
    pub timeout: Option<Duration>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Auto,
            bisection_factor: 32,
            bisection_threshold: 16384,
            threads: 1,
            extra_columns: None,
            float_tolerance: 0.0,
            case_sensitive: true,
            strict_type_checking: false,
            timestamp_precision: 6,
            json_comparison_mode: JsonComparisonMode::Strict,
            timeout: None,
        }
    }
}

/// Orchestrates one comparison run: schema resolution, column
/// intersection, algorithm selection, and result aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOrchestrator;

/// The return value of `diff_tables`: a live stream of difference records
/// plus a future resolving to the final run statistics once the stream is
/// exhausted.
pub struct DiffRun {
    pub records: mpsc::UnboundedReceiver<DifferenceRecord>,
    pub stats: Arc<RunStats>,
}

impl DiffOrchestrator {
    /// The sole programmatic entry point (spec.md §6's `DiffTables`).
    ///
    /// Responsibilities, in order: validate key columns exist and are
    /// order-compatible on both sides; fetch and refine schemas; intersect
    /// extra-column sets, warning (not erroring) about columns unique to
    /// one side; pick the algorithm; run it; accumulate `RunStats`.
    #[tracing::instrument(skip(self, left, right, options))]
    pub async fn diff_tables(
        &self,
        left: TableSegment,
        right: TableSegment,
        options: DiffOptions,
    ) -> DiffResult<DiffRun> {
        if left.key_columns.len() != right.key_columns.len() {
            return Err(DiffError::validation(
                "key_columns must have the same arity on both sides",
            ));
        }

        let left = left.with_schema().await?;
        let right = right.with_schema().await?;

        let left_bits = left.database.dialect().checksum_bits();
        let right_bits = right.database.dialect().checksum_bits();
        if left_bits != right_bits {
            return Err(DiffError::validation(format!(
                "checksum width mismatch: left dialect uses {left_bits} bits, right uses {right_bits}"
            )));
        }

        let stats = RunStats::new();
        stats.mark_started();

        let (left, right) = intersect_extra_columns(left, right, &options, &stats)?;

        let algorithm = match options.algorithm {
            Algorithm::Auto => {
                if left.database.identity() == right.database.identity() {
                    Algorithm::JoinDiff
                } else {
                    Algorithm::HashDiff
                }
            }
            explicit => explicit,
        };

        if algorithm == Algorithm::JoinDiff && left.database.identity() != right.database.identity() {
            return Err(DiffError::validation(
                "joindiff requires both segments to share the same database",
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let run_stats = stats.clone();
        let run = async move {
            match algorithm {
                Algorithm::JoinDiff => {
                    let records = JoinDiffer.diff(&left, &right).await?;
                    run_stats.add_differences(records.len() as u64);
                    for record in records {
                        tx.send(record)
                            .map_err(|_| DiffError::internal("difference stream receiver dropped"))?;
                    }
                    Ok(())
                }
                Algorithm::HashDiff | Algorithm::Auto => {
                    let differ = HashDiffer {
                        bisection_factor: options.bisection_factor,
                        bisection_threshold: options.bisection_threshold,
                        max_concurrency: options.threads.max(1),
                    };
                    differ.diff(&left, &right, tx, run_stats).await
                }
            }
        };

        let task_stats = stats.clone();
        let timeout = options.timeout;
        tokio::spawn(async move {
            let outcome = match timeout {
                Some(duration) => match tokio::time::timeout(duration, run).await {
                    Ok(result) => result,
                    Err(_) => Err(DiffError::Timeout(duration)),
                },
                None => run.await,
            };
            if let Err(err) = outcome {
                tracing::error!(error = %err, "diff run failed");
                task_stats.increment_warnings();
            }
        });

        Ok(DiffRun { records: rx, stats })
    }
}

/// Narrows both segments' `extra_columns` to their intersection (or uses
/// the caller's explicit list), reporting columns unique to one side as a
/// warning rather than a row difference (spec.md §4.6).
fn intersect_extra_columns(
    left: TableSegment,
    right: TableSegment,
    options: &DiffOptions,
    stats: &Arc<RunStats>,
) -> DiffResult<(TableSegment, TableSegment)> {
    let left_schema = left
        .schema()
        .ok_or_else(|| DiffError::internal("left segment missing schema after with_schema()"))?;
    let right_schema = right
        .schema()
        .ok_or_else(|| DiffError::internal("right segment missing schema after with_schema()"))?;

    let chosen: Vec<String> = if let Some(explicit) = &options.extra_columns {
        for name in explicit {
            if left_schema.get(name).is_none() || right_schema.get(name).is_none() {
                return Err(DiffError::validation(format!(
                    "extra column `{name}` not present on both sides"
                )));
            }
        }
        explicit.clone()
    } else {
        let left_names: HashSet<&str> = left.extra_columns.iter().map(String::as_str).collect();
        let right_names: HashSet<&str> = right.extra_columns.iter().map(String::as_str).collect();

        for only_left in left_names.difference(&right_names) {
            tracing::warn!(column = only_left, "column present on left only, excluded");
            stats.increment_warnings();
        }
        for only_right in right_names.difference(&left_names) {
            tracing::warn!(column = only_right, "column present on right only, excluded");
            stats.increment_warnings();
        }

        left.extra_columns
            .iter()
            .filter(|c| right_names.contains(c.as_str()))
            .cloned()
            .collect()
    };

    if options.strict_type_checking {
        for name in &chosen {
            let l = &left_schema.get(name).unwrap().class;
            let r = &right_schema.get(name).unwrap().class;
            if std::mem::discriminant(l) != std::mem::discriminant(r) {
                return Err(DiffError::Schema {
                    column: name.clone(),
                    raw_type: format!("{l:?} vs {r:?}"),
                });
            }
        }
    }

    let mut left = left;
    let mut right = right;
    left.extra_columns = chosen.clone();
    right.extra_columns = chosen;
    Ok((left, right))
}

impl DiffRun {
    /// Drains the remaining stream and returns a final stats snapshot.
    /// Convenience for tests and the CLI; library callers typically consume
    /// `records` incrementally instead.
    pub async fn collect(mut self) -> (Vec<DifferenceRecord>, RunStatsSnapshot) {
        let mut out = Vec::new();
        while let Some(record) = self.records.recv().await {
            out.push(record);
        }
        (out, self.stats.snapshot())
    }
}
