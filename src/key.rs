//! Arithmetic over composite keys: bounds, bisection, mesh construction.
//!
//! Grounded on `table_segment.py`'s `split_key_space` / `split_compound_key_space`
//! / `create_mesh_from_points` from the original implementation, translated
//! to a typed Rust key domain instead of Python's dynamically-typed tuples.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::error::{DiffError, DiffResult};

/// A single component of a composite key. Mixed-type keys are forbidden;
/// arithmetic between incompatible variants is a validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int(i64),
    Decimal(BigDecimal),
    /// Fixed-width hex string (e.g. a UUID or hex digest), treated as a
    /// big integer for interval arithmetic. Limited to 32 hex digits (128
    /// bits) so arithmetic can run on a plain `u128` without a bignum crate.
    Hex(String),
}

impl KeyValue {
    fn domain_name(&self) -> &'static str {
        match self {
            KeyValue::Int(_) => "integer",
            KeyValue::Decimal(_) => "decimal",
            KeyValue::Hex(_) => "hex",
        }
    }

    fn hex_to_u128(s: &str) -> DiffResult<u128> {
        if s.len() > 32 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DiffError::validation(format!(
                "hex key component `{s}` must be at most 32 hex digits"
            )));
        }
        u128::from_str_radix(s, 16)
            .map_err(|e| DiffError::validation(format!("invalid hex key component `{s}`: {e}")))
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(i) => write!(f, "{i}"),
            KeyValue::Decimal(d) => write!(f, "{d}"),
            KeyValue::Hex(h) => write!(f, "{h}"),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (KeyValue::Int(a), KeyValue::Int(b)) => a.partial_cmp(b),
            (KeyValue::Decimal(a), KeyValue::Decimal(b)) => a.partial_cmp(b),
            (KeyValue::Hex(a), KeyValue::Hex(b)) => {
                let (a, b) = (Self::hex_to_u128(a).ok()?, Self::hex_to_u128(b).ok()?);
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }
}

/// An ordered tuple of key-column values: the unit of interval arithmetic
/// for composite keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(pub Vec<KeyValue>);

impl Vector {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Vector(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validates that `min` and `max` share component domains, `min < max`
/// component-wise, and components are pairwise compatible.
pub fn validate_bounds(min: &Vector, max: &Vector) -> DiffResult<()> {
    if min.len() != max.len() {
        return Err(DiffError::validation(
            "min_key and max_key must have the same arity",
        ));
    }
    for (a, b) in min.0.iter().zip(max.0.iter()) {
        if a.domain_name() != b.domain_name() {
            return Err(DiffError::validation(format!(
                "mixed-type key bound: {} vs {}",
                a.domain_name(),
                b.domain_name()
            )));
        }
        match a.partial_cmp(b) {
            Some(Ordering::Less) => {}
            _ => {
                return Err(DiffError::validation(format!(
                    "min_key component {a} must be strictly less than max_key component {b}"
                )))
            }
        }
    }
    Ok(())
}

/// Split `[min, max)` into `count` evenly spaced sub-ranges, returning the
/// `count + 1` boundary values including both endpoints. Degenerates to a
/// single range (2 boundary values) if the interval is too small to hold
/// `count` distinct interior points.
pub fn split_key_space(min: &KeyValue, max: &KeyValue, count: usize) -> DiffResult<Vec<KeyValue>> {
    match (min, max) {
        (KeyValue::Int(lo), KeyValue::Int(hi)) => {
            let (lo, hi) = (*lo, *hi);
            if hi <= lo {
                return Err(DiffError::validation("min_key must be < max_key"));
            }
            let span = (hi - lo) as u128;
            let count = if span <= count as u128 { 1 } else { count };
            let mut points = vec![KeyValue::Int(lo)];
            for i in 1..count {
                let frac = (span * i as u128) / count as u128;
                points.push(KeyValue::Int(lo + frac as i64));
            }
            points.push(KeyValue::Int(hi));
            Ok(dedup_adjacent(points))
        }
        (KeyValue::Decimal(lo), KeyValue::Decimal(hi)) => {
            let (lo, hi) = (lo.clone(), hi.clone());
            if hi <= lo {
                return Err(DiffError::validation("min_key must be < max_key"));
            }
            let span = hi.clone() - lo.clone();
            let mut points = vec![KeyValue::Decimal(lo.clone())];
            for i in 1..count {
                let frac = span.clone() * BigDecimal::from(i as u64) / BigDecimal::from(count as u64);
                points.push(KeyValue::Decimal(lo.clone() + frac));
            }
            points.push(KeyValue::Decimal(hi));
            Ok(dedup_adjacent(points))
        }
        (KeyValue::Hex(lo), KeyValue::Hex(hi)) => {
            let width = lo.len().max(hi.len());
            let (lo_n, hi_n) = (KeyValue::hex_to_u128(lo)?, KeyValue::hex_to_u128(hi)?);
            if hi_n <= lo_n {
                return Err(DiffError::validation("min_key must be < max_key"));
            }
            let span = hi_n - lo_n;
            let count = if span <= count as u128 { 1 } else { count };
            let mut points = vec![KeyValue::Hex(format!("{lo_n:0width$x}", width = width))];
            for i in 1..count {
                let frac = (span * i as u128) / count as u128;
                points.push(KeyValue::Hex(format!("{:0width$x}", lo_n + frac, width = width)));
            }
            points.push(KeyValue::Hex(format!("{hi_n:0width$x}", width = width)));
            Ok(dedup_adjacent(points))
        }
        _ => Err(DiffError::validation(
            "min_key and max_key must share the same domain",
        )),
    }
}

fn dedup_adjacent(points: Vec<KeyValue>) -> Vec<KeyValue> {
    let mut out: Vec<KeyValue> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Returns, per key dimension, the list of split points (including bounds).
pub fn split_compound_key_space(min: &Vector, max: &Vector, count: usize) -> DiffResult<Vec<Vec<KeyValue>>> {
    validate_bounds(min, max)?;
    min.0
        .iter()
        .zip(max.0.iter())
        .map(|(mn, mx)| split_key_space(mn, mx, count))
        .collect()
}

/// Given split points along each axis, returns the N-dimensional mesh of
/// boxes whose corners align with those points: `len(boxes) == prod(len(axis) - 1)`.
pub fn create_mesh_from_points(values_per_dim: &[Vec<KeyValue>]) -> DiffResult<Vec<(Vector, Vector)>> {
    if values_per_dim.iter().any(|v| v.len() < 2) {
        return Err(DiffError::internal(
            "each key dimension needs at least 2 split points (min and max)",
        ));
    }

    let ranges: Vec<Vec<(KeyValue, KeyValue)>> = values_per_dim
        .iter()
        .map(|values| {
            values
                .windows(2)
                .map(|w| (w[0].clone(), w[1].clone()))
                .collect()
        })
        .collect();

    let mut boxes = Vec::new();
    cartesian_product(&ranges, 0, &mut Vec::new(), &mut boxes);
    Ok(boxes)
}

fn cartesian_product(
    ranges: &[Vec<(KeyValue, KeyValue)>],
    dim: usize,
    current: &mut Vec<(KeyValue, KeyValue)>,
    out: &mut Vec<(Vector, Vector)>,
) {
    if dim == ranges.len() {
        let min = Vector::new(current.iter().map(|(a, _)| a.clone()).collect());
        let max = Vector::new(current.iter().map(|(_, b)| b.clone()).collect());
        out.push((min, max));
        return;
    }
    for pair in &ranges[dim] {
        current.push(pair.clone());
        cartesian_product(ranges, dim + 1, current, out);
        current.pop();
    }
}

/// The key-space volume of a bounded range, used for termination arguments
/// and cost estimation. Returns `None` when the volume cannot be expressed
/// as a finite integer (e.g. decimal domains).
pub fn approximate_size(min: &Vector, max: &Vector) -> Option<u128> {
    let mut total: u128 = 1;
    for (a, b) in min.0.iter().zip(max.0.iter()) {
        let span = match (a, b) {
            (KeyValue::Int(lo), KeyValue::Int(hi)) => (*hi - *lo) as u128,
            (KeyValue::Hex(lo), KeyValue::Hex(hi)) => {
                KeyValue::hex_to_u128(hi).ok()? - KeyValue::hex_to_u128(lo).ok()?
            }
            (KeyValue::Decimal(lo), KeyValue::Decimal(hi)) => (hi.clone() - lo.clone()).to_u128()?,
            _ => return None,
        };
        total = total.saturating_mul(span.max(1));
    }
    Some(total)
}
