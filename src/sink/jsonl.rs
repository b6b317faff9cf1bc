//! Appends newline-delimited JSON to a file or writer. Independent of any
//! specific database, the desirable default "file sink" implementation.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::diff::DifferenceRecord;
use crate::error::{DiffError, DiffResult};
use crate::key::{KeyValue, Vector};
use crate::stats::RunStatsSnapshot;

use super::ResultSink;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonlRecord {
    MissingOnRight {
        run_id: uuid::Uuid,
        key: Vec<String>,
    },
    MissingOnLeft {
        run_id: uuid::Uuid,
        key: Vec<String>,
    },
    Changed {
        run_id: uuid::Uuid,
        key: Vec<String>,
        differing_columns: Vec<String>,
    },
    RunSummary {
        run_id: uuid::Uuid,
        stats: RunStatsSnapshot,
    },
}

fn key_to_strings(key: &Vector) -> Vec<String> {
    key.0
        .iter()
        .map(|k| match k {
            KeyValue::Int(i) => i.to_string(),
            KeyValue::Decimal(d) => d.to_string(),
            KeyValue::Hex(h) => h.clone(),
        })
        .collect()
}

/// Writes one JSON object per line to an async writer, e.g. a file opened
/// with `tokio::fs::File::create`.
pub struct JsonlSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    async fn write_line(&mut self, value: &JsonlRecord) -> DiffResult<()> {
        let mut line =
            serde_json::to_string(value).map_err(|e| DiffError::internal(e.to_string()))?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| DiffError::internal(e.to_string()))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ResultSink for JsonlSink<W> {
    async fn accept(&mut self, run_id: uuid::Uuid, record: DifferenceRecord) -> DiffResult<()> {
        let entry = match record {
            DifferenceRecord::MissingOnRight { key } => JsonlRecord::MissingOnRight {
                run_id,
                key: key_to_strings(&key),
            },
            DifferenceRecord::MissingOnLeft { key } => JsonlRecord::MissingOnLeft {
                run_id,
                key: key_to_strings(&key),
            },
            DifferenceRecord::Changed {
                key,
                differing_columns,
                ..
            } => JsonlRecord::Changed {
                run_id,
                key: key_to_strings(&key),
                differing_columns,
            },
        };
        self.write_line(&entry).await
    }

    async fn finish(&mut self, run_id: uuid::Uuid, stats: RunStatsSnapshot) -> DiffResult<()> {
        self.write_line(&JsonlRecord::RunSummary { run_id, stats }).await?;
        self.writer
            .flush()
            .await
            .map_err(|e| DiffError::internal(e.to_string()))
    }
}
