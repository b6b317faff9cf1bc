//! Recursive checksum-bisection algorithm over segment pairs.
//!
//! Grounded on `table_segment.py`'s `split_key_space`/`split_compound_key_space`
//! consumers and the recursive-diff sketch in `data_diff/diff_tables.py`'s
//! `HashDiffer` (see `examples/original_source/_INDEX.md`); re-modeled per
//! Design Note §9 as an explicit `Equal | Unequal` sum type driving task
//! fan-out instead of exception-based control flow over nested calls.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc::UnboundedSender;

use crate::database::Row;
use crate::diff::DifferenceRecord;
use crate::error::{DiffError, DiffResult};
use crate::key::Vector;
use crate::normalize::{self, NormalizeOptions};
use crate::schema::Schema;
use crate::segment::TableSegment;
use crate::stats::RunStats;

/// Tuning knobs for the bisection recursion; mirrors the `bisection_factor`/
/// `bisection_threshold` fields of `DiffOptions`.
#[derive(Debug, Clone, Copy)]
pub struct HashDiffer {
    pub bisection_factor: usize,
    pub bisection_threshold: u64,
    /// Caps fan-out of concurrently in-flight child-segment-pair recursions
    /// at any one level, independent of the orchestrator's top-level worker
    /// pool size.
    pub max_concurrency: usize,
}

impl Default for HashDiffer {
    fn default() -> Self {
        Self {
            bisection_factor: 32,
            bisection_threshold: 16384,
            max_concurrency: 4,
        }
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl HashDiffer {
    /// Runs the algorithm for one top-level segment pair, streaming
    /// [`DifferenceRecord`]s to `tx` as they're found. Returns once the
    /// whole key space has been classified.
    pub async fn diff(
        &self,
        left: &TableSegment,
        right: &TableSegment,
        tx: UnboundedSender<DifferenceRecord>,
        stats: Arc<RunStats>,
    ) -> DiffResult<()> {
        let (min, max) = self.resolve_bounds(left, right).await?;
        self.diff_bounded(left, right, min, max, &tx, &stats).await
    }

    /// Resolves the key range bisection should aim at, without narrowing
    /// either segment's own bounds.
    ///
    /// When neither side carries bounds yet, each side's true range is
    /// queried and the intersection is taken (per `table_segment.py`'s
    /// `query_key_range`) purely as a hint for where `choose_checkpoints`
    /// should split. It is never applied back onto `left`/`right` as a query
    /// filter: doing so would symmetrically cap both sides at the *narrower*
    /// side's true max, which — combined with `Database::execute`'s
    /// exclusive upper bound — would silently drop the wider side's rows
    /// past that point instead of reporting them missing. Leaving the
    /// segments unbounded and letting `segment_by_checkpoints`'s edge
    /// inheritance carry `None` down to the outermost child at every
    /// recursion level keeps both edges reachable.
    async fn resolve_bounds(
        &self,
        left: &TableSegment,
        right: &TableSegment,
    ) -> DiffResult<(Option<Vector>, Option<Vector>)> {
        if let (Some(min), Some(max)) = (&left.min_key, &left.max_key) {
            return Ok((Some(min.clone()), Some(max.clone())));
        }
        let (left_range, right_range) = tokio::try_join!(left.query_key_range(), right.query_key_range())?;
        let (left_range, right_range) = match (left_range, right_range) {
            (Some(l), Some(r)) => (l, r),
            // One side empty: the caller handles the all-missing case via
            // the leaf path below (count_and_checksum will report 0).
            _ => return Ok((None, None)),
        };
        let min = elementwise_max(&left_range.0, &right_range.0)?;
        let max = elementwise_min(&left_range.1, &right_range.1)?;
        Ok((Some(min), Some(max)))
    }

    fn diff_bounded<'a>(
        &'a self,
        left: &'a TableSegment,
        right: &'a TableSegment,
        min: Option<Vector>,
        max: Option<Vector>,
        tx: &'a UnboundedSender<DifferenceRecord>,
        stats: &'a Arc<RunStats>,
    ) -> BoxFuture<'a, DiffResult<()>> {
        Box::pin(async move {
            let left = left.clone();
            let right = right.clone();

            let (count_left, checksum_left) = left.count_and_checksum().await?;
            stats.increment_checksums_computed();
            let (count_right, checksum_right) = right.count_and_checksum().await?;
            stats.increment_checksums_computed();

            let leaf_size = count_left.max(count_right);
            let volume_collapsed = left
                .approximate_size()
                .map(|v| v <= self.bisection_threshold as u128)
                .unwrap_or(false);

            // Bounds are unresolvable only when both sides were empty (one
            // side entirely missing cannot be bisected); fall through to the
            // leaf path, which correctly emits every row of the nonempty
            // side as missing.
            if leaf_size <= self.bisection_threshold || volume_collapsed || min.is_none() {
                return self.diff_leaf(&left, &right, tx, stats).await;
            }

            if count_left == count_right && checksum_left == checksum_right {
                return Ok(());
            }

            let Some((bound_min, bound_max)) = min.zip(max) else {
                return self.diff_leaf(&left, &right, tx, stats).await;
            };

            let checkpoints = left.choose_checkpoints(self.bisection_factor, (&bound_min, &bound_max))?;
            let left_children = left.segment_by_checkpoints(&checkpoints)?;
            let right_children = right.segment_by_checkpoints(&checkpoints)?;

            // A mesh that collapses to a single cell (`key::split_key_space`'s
            // degenerate case, reachable whenever `bisection_factor` exceeds
            // the remaining key span) inherits both of the parent's own
            // bounds — the "child" is bounds-identical to the parent, so
            // recursing would compare the same segment forever. Falling
            // through to the leaf path here is the only way to make progress.
            if left_children.len() <= 1 {
                return self.diff_leaf(&left, &right, tx, stats).await;
            }

            if left_children.len() != right_children.len() {
                return Err(DiffError::internal(
                    "left/right segment_by_checkpoints produced different child counts",
                ));
            }

            stats.increment_segments_expanded();

            let pairs: Vec<_> = left_children.into_iter().zip(right_children).collect();
            stream::iter(pairs)
                .map(|(l, r)| async move {
                    let child_bounds = (l.min_key.clone(), l.max_key.clone());
                    self.diff_bounded(&l, &r, child_bounds.0, child_bounds.1, tx, stats).await
                })
                .buffer_unordered(self.max_concurrency)
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect::<DiffResult<Vec<()>>>()?;

            Ok(())
        })
    }

    async fn diff_leaf(
        &self,
        left: &TableSegment,
        right: &TableSegment,
        tx: &UnboundedSender<DifferenceRecord>,
        stats: &Arc<RunStats>,
    ) -> DiffResult<()> {
        stats.increment_leaves_compared();
        let (left_rows, right_rows) = tokio::try_join!(left.get_values(), right.get_values())?;
        stats.add_rows_counted(left_rows.len() as u64, right_rows.len() as u64);
        let schema = left
            .schema()
            .ok_or_else(|| DiffError::internal("leaf comparison requires a bound schema"))?;
        let opts = NormalizeOptions {
            case_sensitive: left.semantics.case_sensitive,
            float_tolerance: left.semantics.float_tolerance,
            timestamp_precision: left.semantics.timestamp_precision,
            json_comparison_mode: left.semantics.json_comparison_mode,
        };

        merge_by_key(
            &left_rows,
            &right_rows,
            &left.extra_columns,
            schema,
            &opts,
            tx,
            stats,
        )
    }
}

fn elementwise_max(a: &Vector, b: &Vector) -> DiffResult<Vector> {
    combine(a, b, |x, y| if x >= y { x } else { y })
}

fn elementwise_min(a: &Vector, b: &Vector) -> DiffResult<Vector> {
    combine(a, b, |x, y| if x <= y { x } else { y })
}

fn combine(
    a: &Vector,
    b: &Vector,
    pick: impl Fn(&crate::key::KeyValue, &crate::key::KeyValue) -> crate::key::KeyValue,
) -> DiffResult<Vector> {
    if a.len() != b.len() {
        return Err(DiffError::validation("left/right key ranges have different arity"));
    }
    Ok(Vector::new(
        a.0.iter()
            .zip(b.0.iter())
            .map(|(x, y)| pick(x, y).clone())
            .collect(),
    ))
}

/// Pairs rows by key via an in-memory merge (both inputs are sorted by key,
/// per `TableSegment::get_values`'s `ORDER BY`). Keys present on only one
/// side yield `MissingOnLeft`/`MissingOnRight`; keys on both sides are
/// compared component-wise on normalized extras.
fn merge_by_key(
    left: &[(Vector, Row)],
    right: &[(Vector, Row)],
    extra_columns: &[String],
    schema: &Schema,
    opts: &NormalizeOptions,
    tx: &UnboundedSender<DifferenceRecord>,
    stats: &Arc<RunStats>,
) -> DiffResult<()> {
    let mut i = 0;
    let mut j = 0;
    while i < left.len() && j < right.len() {
        let ord = compare_keys(&left[i].0, &right[j].0);
        match ord {
            std::cmp::Ordering::Less => {
                send(tx, DifferenceRecord::MissingOnRight { key: left[i].0.clone() }, stats)?;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                send(tx, DifferenceRecord::MissingOnLeft { key: right[j].0.clone() }, stats)?;
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                let (key, left_row) = &left[i];
                let (_, right_row) = &right[j];
                let differing = differing_columns(left_row, right_row, extra_columns, schema, opts);
                if !differing.is_empty() {
                    send(
                        tx,
                        DifferenceRecord::Changed {
                            key: key.clone(),
                            left_row: left_row.clone(),
                            right_row: right_row.clone(),
                            differing_columns: differing,
                        },
                        stats,
                    )?;
                }
                i += 1;
                j += 1;
            }
        }
    }
    for (key, _) in &left[i..] {
        send(tx, DifferenceRecord::MissingOnRight { key: key.clone() }, stats)?;
    }
    for (key, _) in &right[j..] {
        send(tx, DifferenceRecord::MissingOnLeft { key: key.clone() }, stats)?;
    }
    Ok(())
}

fn compare_keys(a: &Vector, b: &Vector) -> std::cmp::Ordering {
    for (x, y) in a.0.iter().zip(b.0.iter()) {
        match x.partial_cmp(y) {
            Some(std::cmp::Ordering::Equal) | None => continue,
            Some(ord) => return ord,
        }
    }
    std::cmp::Ordering::Equal
}

fn differing_columns(
    left_row: &Row,
    right_row: &Row,
    extra_columns: &[String],
    schema: &Schema,
    opts: &NormalizeOptions,
) -> Vec<String> {
    extra_columns
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let class = &schema.get(name)?.class;
            let l = normalize::normalize(&left_row.0[idx], class, opts);
            let r = normalize::normalize(&right_row.0[idx], class, opts);
            (l != r).then(|| name.clone())
        })
        .collect()
}

fn send(
    tx: &UnboundedSender<DifferenceRecord>,
    record: DifferenceRecord,
    stats: &Arc<RunStats>,
) -> DiffResult<()> {
    tx.send(record)
        .map_err(|_| DiffError::internal("difference stream receiver dropped"))?;
    stats.add_differences(1);
    Ok(())
}
