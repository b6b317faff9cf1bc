//! A tiny SQL expression tree, rendered per-[`Dialect`](crate::dialect::Dialect).
//!
//! Generalizes the teacher's ad-hoc-string-concatenation replacement
//! (`Expr` + exhaustive-match rendering) down to exactly what normalization
//! and checksum expressions need: no joins, no CTEs, no window functions.

mod expr;

pub use expr::{BinOp, Expr};
