//! Run-level counters accumulated while a comparison is in flight.
//!
//! Grounded on the response/summary structs in `worker::protocol`
//! (`RowCountResponse`, `GetDatabaseInfoResponse`): plain serde-derived
//! snapshot types returned to the caller, backed here by atomics so they
//! can be updated concurrently from the worker pool without a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared, lock-free counters updated by the orchestrator's worker pool
/// as segments are expanded and compared.
#[derive(Debug, Default)]
pub struct RunStats {
    rows_counted_left: AtomicU64,
    rows_counted_right: AtomicU64,
    checksums_computed: AtomicU64,
    segments_expanded: AtomicU64,
    segments_compared_as_leaves: AtomicU64,
    differences_found: AtomicU64,
    warnings_emitted: AtomicU64,
    started_at: std::sync::OnceLock<Instant>,
}

impl RunStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_started(&self) {
        let _ = self.started_at.set(Instant::now());
    }

    pub fn add_rows_counted(&self, left: u64, right: u64) {
        self.rows_counted_left.fetch_add(left, Ordering::Relaxed);
        self.rows_counted_right.fetch_add(right, Ordering::Relaxed);
    }

    pub fn increment_checksums_computed(&self) {
        self.checksums_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_segments_expanded(&self) {
        self.segments_expanded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_leaves_compared(&self) {
        self.segments_compared_as_leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_differences(&self, n: u64) {
        self.differences_found.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_warnings(&self) {
        self.warnings_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.get().map(Instant::elapsed).unwrap_or_default()
    }

    /// A point-in-time, serializable snapshot for progress reporting or
    /// the final run summary.
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            rows_counted_left: self.rows_counted_left.load(Ordering::Relaxed),
            rows_counted_right: self.rows_counted_right.load(Ordering::Relaxed),
            checksums_computed: self.checksums_computed.load(Ordering::Relaxed),
            segments_expanded: self.segments_expanded.load(Ordering::Relaxed),
            segments_compared_as_leaves: self.segments_compared_as_leaves.load(Ordering::Relaxed),
            differences_found: self.differences_found.load(Ordering::Relaxed),
            warnings_emitted: self.warnings_emitted.load(Ordering::Relaxed),
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatsSnapshot {
    pub rows_counted_left: u64,
    pub rows_counted_right: u64,
    pub checksums_computed: u64,
    pub segments_expanded: u64,
    pub segments_compared_as_leaves: u64,
    pub differences_found: u64,
    pub warnings_emitted: u64,
    pub elapsed_ms: u64,
}
