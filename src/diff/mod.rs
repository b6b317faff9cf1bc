//! Difference records and the two algorithms that produce them.

pub mod hashdiff;
pub mod joindiff;

use crate::key::Vector;

/// `{kind, key, left_row?, right_row?, differing_columns?}` per spec.md §3.
/// Records are emitted in no guaranteed order.
#[derive(Debug, Clone, PartialEq)]
pub enum DifferenceRecord {
    MissingOnRight {
        key: Vector,
    },
    MissingOnLeft {
        key: Vector,
    },
    Changed {
        key: Vector,
        left_row: crate::database::Row,
        right_row: crate::database::Row,
        differing_columns: Vec<String>,
    },
}

impl DifferenceRecord {
    pub fn key(&self) -> &Vector {
        match self {
            DifferenceRecord::MissingOnRight { key }
            | DifferenceRecord::MissingOnLeft { key }
            | DifferenceRecord::Changed { key, .. } => key,
        }
    }

    /// The record with `MissingOnLeft`/`MissingOnRight` swapped and row
    /// sides exchanged — used to verify the Symmetry testable property.
    pub fn flipped(&self) -> Self {
        match self {
            DifferenceRecord::MissingOnRight { key } => DifferenceRecord::MissingOnLeft { key: key.clone() },
            DifferenceRecord::MissingOnLeft { key } => DifferenceRecord::MissingOnRight { key: key.clone() },
            DifferenceRecord::Changed {
                key,
                left_row,
                right_row,
                differing_columns,
            } => DifferenceRecord::Changed {
                key: key.clone(),
                left_row: right_row.clone(),
                right_row: left_row.clone(),
                differing_columns: differing_columns.clone(),
            },
        }
    }
}
