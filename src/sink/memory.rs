//! Collects records into a `Vec`, for tests and small ad-hoc runs.

use async_trait::async_trait;

use crate::diff::DifferenceRecord;
use crate::error::DiffResult;
use crate::stats::RunStatsSnapshot;

use super::ResultSink;

#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<DifferenceRecord>,
    pub stats: Option<RunStatsSnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn accept(&mut self, _run_id: uuid::Uuid, record: DifferenceRecord) -> DiffResult<()> {
        self.records.push(record);
        Ok(())
    }

    async fn finish(&mut self, _run_id: uuid::Uuid, stats: RunStatsSnapshot) -> DiffResult<()> {
        self.stats = Some(stats);
        Ok(())
    }
}
