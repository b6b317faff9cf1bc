//! Optional collaborators that consume a diff run's output (spec.md §4.8).

pub mod jsonl;
pub mod memory;
pub mod relational;

use async_trait::async_trait;

use crate::diff::DifferenceRecord;
use crate::error::DiffResult;
use crate::stats::RunStatsSnapshot;

/// Consumes the emitted difference records and final `RunStats`.
///
/// Implementations must accept records incrementally (the diff stream may
/// be unbounded in practice), must not block the orchestrator beyond a
/// fixed buffer, and must idempotently upsert by `(run_id, key)` if they
/// write to a durable store.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn accept(&mut self, run_id: uuid::Uuid, record: DifferenceRecord) -> DiffResult<()>;

    async fn finish(&mut self, run_id: uuid::Uuid, stats: RunStatsSnapshot) -> DiffResult<()>;
}
