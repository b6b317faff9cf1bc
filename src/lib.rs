//! # tablediff
//!
//! A cross-database table comparison engine: checksum-bisection
//! (`HashDiff`) and join-based (`JoinDiff`) row diffing behind one
//! dialect-abstracted entry point.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            TableSegment (key-range + columns)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [DiffOrchestrator picks an algorithm]
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │   HashDiffer (bisection)  │   │   JoinDiffer (same-db fast│
//! │   cross-database default  │   │   path, single round-trip)│
//! └───────────────────────────┘   └───────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        DifferenceRecord stream + RunStats (→ ResultSink)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Each backend is reached through a [`dialect::Dialect`] implementation
//! paired with a [`database::Database`] connection; the crate ships only
//! [`database::memory::MemoryDatabase`], an in-process reference
//! implementation used for tests and the CLI.

pub mod config;
pub mod database;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod key;
pub mod normalize;
pub mod orchestrator;
pub mod sampling;
pub mod schema;
pub mod segment;
pub mod sink;
pub mod sql;
pub mod stats;

pub mod prelude {
    pub use crate::database::{Database, TablePath};
    pub use crate::diff::DifferenceRecord;
    pub use crate::error::{DiffError, DiffResult};
    pub use crate::orchestrator::{Algorithm, DiffOptions, DiffOrchestrator, DiffRun};
    pub use crate::segment::TableSegment;
}
