use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClickHouse;

impl Dialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "uint8" | "int8" | "uint16" | "int16" | "uint32" | "int32" | "uint64" | "int64" => {
                SemanticClass::Integer
            }
            "float32" | "float64" => SemanticClass::Float,
            "uuid" => SemanticClass::Text {
                case_sensitive: false,
            },
            "datetime" | "datetime64" => SemanticClass::Timestamp {
                precision: 6,
                with_tz: false,
            },
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("toString(round({expr}, {scale}))")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let _ = with_tz;
        format!("formatDateTime({expr}, '%Y-%m-%d %H:%M:%S.{}')", "0".repeat(precision as usize))
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("lower(toString({expr}))")
    }

    fn md5_as_int(&self, expr: &str) -> String {
        format!("reinterpretAsUInt128(MD5({expr}))")
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("substring(hex(MD5({expr})), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("arrayStringConcat([{}], '|')", exprs.join(", "))
    }

    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System | SamplingMethod::Bernoulli => {
                Some(format!("SAMPLE {}", percent / 100.0))
            }
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("toString({})", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("(cityHash64({concat}) % {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
