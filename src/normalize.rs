//! Canonical string normalization of column values.
//!
//! This is the in-process equivalent of what a [`Dialect`](crate::dialect::Dialect)
//! renders as SQL (`normalize_number`, `normalize_timestamp`, ...): given a
//! [`Value`](crate::database::Value) and its [`SemanticClass`], produce the
//! canonical string two logically-equal values render to identically,
//! honoring the same comparison knobs (`case_sensitive`, `float_tolerance`,
//! `timestamp_precision`, `json_comparison_mode`) that `DiffOptions` exposes.
//! [`MemoryDatabase`](crate::database::memory::MemoryDatabase) uses this
//! directly instead of generating SQL; `HashDiffer`'s leaf comparator uses it
//! for the final value-level check regardless of backend.

use bigdecimal::BigDecimal;

use crate::database::Value;
use crate::schema::SemanticClass;

/// How JSON-classed columns are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonComparisonMode {
    /// Byte-for-byte string equality after minimal whitespace normalization.
    Strict,
    /// Key-order-independent structural equality.
    Structural,
}

impl Default for JsonComparisonMode {
    fn default() -> Self {
        JsonComparisonMode::Strict
    }
}

/// Comparison semantics shared by `MemoryDatabase` row normalization and
/// `HashDiffer`'s leaf comparator.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub case_sensitive: bool,
    pub float_tolerance: f64,
    pub timestamp_precision: u8,
    pub json_comparison_mode: JsonComparisonMode,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            float_tolerance: 0.0,
            timestamp_precision: 6,
            json_comparison_mode: JsonComparisonMode::default(),
        }
    }
}

/// Render `value` to its canonical string form under `class`/`opts`.
/// `None` on either side represents SQL `NULL`; renders as the sentinel
/// `"\u{0}NULL"`, a value no real column payload can produce.
pub fn normalize(value: &Value, class: &SemanticClass, opts: &NormalizeOptions) -> String {
    if matches!(value, Value::Null) {
        return "\u{0}NULL".to_string();
    }

    match (class, value) {
        (SemanticClass::Integer, Value::Int(i)) => i.to_string(),
        (SemanticClass::Decimal { scale, .. }, Value::Decimal(d)) => normalize_decimal(d, *scale),
        (SemanticClass::Decimal { scale, .. }, Value::Int(i)) => {
            normalize_decimal(&BigDecimal::from(*i), *scale)
        }
        (SemanticClass::Float, Value::Float(f)) => normalize_float(*f, opts.float_tolerance),
        (SemanticClass::Boolean, Value::Bool(b)) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        (SemanticClass::Text { .. }, Value::Text(s)) => normalize_text(s, opts.case_sensitive),
        (SemanticClass::Date, Value::Date(d)) => d.format("%Y-%m-%d").to_string(),
        (SemanticClass::Timestamp { with_tz, .. }, Value::Timestamp(ts)) => {
            normalize_timestamp(ts, opts.timestamp_precision, *with_tz)
        }
        (SemanticClass::Binary, Value::Binary(b)) => hex::encode(b),
        (SemanticClass::Json, Value::Json(j)) => normalize_json(j, opts.json_comparison_mode),
        // Type/value mismatch: fall back to the value's own Display. Schema
        // resolution should make this unreachable for well-formed rows.
        _ => value.to_string(),
    }
}

fn normalize_decimal(d: &BigDecimal, scale: u8) -> String {
    let rounded = d.with_scale(scale as i64);
    rounded.to_string()
}

fn normalize_float(f: f64, tolerance: f64) -> String {
    if tolerance > 0.0 {
        let bucket = (f / tolerance).round() * tolerance;
        format!("{bucket:.9}")
    } else {
        format!("{f:.9}")
    }
}

fn normalize_text(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

fn normalize_timestamp(ts: &chrono::NaiveDateTime, precision: u8, with_tz: bool) -> String {
    let _ = with_tz; // caller is responsible for pre-conversion to UTC, per spec.md 4.1
    let micros = ts.and_utc().timestamp_subsec_micros();
    let frac_full = format!("{micros:06}");
    let frac: String = frac_full.chars().take(precision as usize).collect();
    if precision == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        format!("{}.{}", ts.format("%Y-%m-%d %H:%M:%S"), frac)
    }
}

fn normalize_json(raw: &str, mode: JsonComparisonMode) -> String {
    match mode {
        JsonComparisonMode::Strict => raw.split_whitespace().collect::<Vec<_>>().join(" "),
        JsonComparisonMode::Structural => serde_json::from_str::<serde_json::Value>(raw)
            .map(|v| canonicalize_json(&v).to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}

/// Recursively sort object keys so structurally-equal JSON renders
/// byte-identically regardless of source key order.
fn canonicalize_json(v: &serde_json::Value) -> serde_json::Value {
    match v {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_json(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize_json).collect())
        }
        other => other.clone(),
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
