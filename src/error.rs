//! Unified error type for the diff engine.
//!
//! Mirrors the error taxonomy of the design: validation and schema errors are
//! raised synchronously before any I/O, query errors carry the originating
//! SQL-ish context for diagnostics, and internal errors mark invariant
//! violations that should never happen.

use std::fmt;

/// Result type used throughout the crate.
pub type DiffResult<T> = Result<T, DiffError>;

/// Unified error type for the diff engine.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Incompatible key types, missing columns, illegal bounds, unparseable
    /// sampling spec. Always raised before any query is issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A column exists in the catalog but has an unmappable type and
    /// `strict_type_checking` is set.
    #[error("schema error: column `{column}` has unsupported type `{raw_type}`")]
    Schema { column: String, raw_type: String },

    /// A backend-originated error during query execution.
    #[error("query failed ({kind:?}): {message}")]
    Query {
        kind: QueryErrorKind,
        message: String,
        /// The query fragment that produced the error, for diagnostics only.
        context: Option<String>,
    },

    /// The run exceeded its configured wall-clock budget.
    #[error("run exceeded timeout of {0:?}")]
    Timeout(std::time::Duration),

    /// The caller requested cancellation.
    #[error("run was cancelled")]
    Cancelled,

    /// An invariant was violated; this should never happen in correct code.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Sub-classification of [`DiffError::Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Connection loss, serialization failure, deadlock — worth retrying.
    Transient,
    /// Anything else; surfaces to the caller without retry.
    Permanent,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryErrorKind::Transient => write!(f, "transient"),
            QueryErrorKind::Permanent => write!(f, "permanent"),
        }
    }
}

impl DiffError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DiffError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DiffError::Internal(msg.into())
    }

    pub fn transient_query(message: impl Into<String>, context: Option<String>) -> Self {
        DiffError::Query {
            kind: QueryErrorKind::Transient,
            message: message.into(),
            context,
        }
    }

    pub fn permanent_query(message: impl Into<String>, context: Option<String>) -> Self {
        DiffError::Query {
            kind: QueryErrorKind::Permanent,
            message: message.into(),
            context,
        }
    }

    /// Whether a driver-level error of this kind should be retried with
    /// exponential backoff before surfacing to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiffError::Query {
                kind: QueryErrorKind::Transient,
                ..
            }
        )
    }
}
