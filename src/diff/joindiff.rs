//! Same-database set-difference via full outer join with row-level
//! comparison, per spec.md §4.5.

use crate::database::{JoinRow, QueryKind};
use crate::diff::DifferenceRecord;
use crate::error::{DiffError, DiffResult};
use crate::normalize::{self, NormalizeOptions};
use crate::schema::Schema;
use crate::segment::TableSegment;

#[derive(Debug, Clone, Copy, Default)]
pub struct JoinDiffer;

impl JoinDiffer {
    /// Applicable only when both segments share the same `Database`
    /// instance. `TableSegment::with_schema()` must already have been
    /// called on both sides.
    pub async fn diff(
        &self,
        left: &TableSegment,
        right: &TableSegment,
    ) -> DiffResult<Vec<DifferenceRecord>> {
        if left.database.identity() != right.database.identity() {
            return Err(DiffError::internal(
                "JoinDiffer requires both segments to share the same Database",
            ));
        }

        self.assert_key_uniqueness(left).await?;
        self.assert_key_uniqueness(right).await?;

        let schema = left
            .schema()
            .ok_or_else(|| DiffError::internal("JoinDiffer requires a bound schema"))?;
        let opts = NormalizeOptions {
            case_sensitive: left.semantics.case_sensitive,
            float_tolerance: left.semantics.float_tolerance,
            timestamp_precision: left.semantics.timestamp_precision,
            json_comparison_mode: left.semantics.json_comparison_mode,
        };

        let rows = left
            .database
            .execute_join(
                &left.to_segment_query(QueryKind::Rows)?,
                &right.to_segment_query(QueryKind::Rows)?,
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| classify(row, &left.extra_columns, schema, &opts))
            .collect())
    }

    /// JoinDiff requires key uniqueness on both sides; violation is a
    /// validation error raised before any query is issued (Design Note §9).
    async fn assert_key_uniqueness(&self, segment: &TableSegment) -> DiffResult<()> {
        if !segment.database.dialect().supports_primary_key_uniqueness() {
            return Ok(());
        }
        let unique = segment
            .database
            .has_unique_key(&segment.table_path, &segment.key_columns)
            .await?;
        if !unique {
            return Err(DiffError::validation(format!(
                "JoinDiff requires key uniqueness on both sides; `{}` has no declared unique constraint on {:?}",
                segment.table_path, segment.key_columns
            )));
        }
        Ok(())
    }
}

fn classify(
    row: JoinRow,
    extra_columns: &[String],
    schema: &Schema,
    opts: &NormalizeOptions,
) -> Option<DifferenceRecord> {
    match (row.left, row.right) {
        (Some(_), None) => Some(DifferenceRecord::MissingOnRight { key: row.key }),
        (None, Some(_)) => Some(DifferenceRecord::MissingOnLeft { key: row.key }),
        (Some(left_row), Some(right_row)) => {
            let differing: Vec<String> = extra_columns
                .iter()
                .enumerate()
                .filter_map(|(idx, name)| {
                    let class = &schema.get(name)?.class;
                    let l = normalize::normalize(&left_row.0[idx], class, opts);
                    let r = normalize::normalize(&right_row.0[idx], class, opts);
                    (l != r).then(|| name.clone())
                })
                .collect();
            if differing.is_empty() {
                None
            } else {
                Some(DifferenceRecord::Changed {
                    key: row.key,
                    left_row,
                    right_row,
                    differing_columns: differing,
                })
            }
        }
        (None, None) => None,
    }
}
