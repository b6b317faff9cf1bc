use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "datetime" => SemanticClass::Timestamp {
                precision: 6,
                with_tz: false,
            },
            "tinyint(1)" => SemanticClass::Boolean,
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("CAST(ROUND({expr}, {scale}) AS CHAR)")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let _ = with_tz;
        format!("DATE_FORMAT({expr}, '%Y-%m-%d %H:%i:%S.{}')", "0".repeat(precision as usize))
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("LOWER(CAST({expr} AS CHAR(36)))")
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(16);
        format!("CONV(SUBSTRING(MD5({expr}), 1, {digits}), 16, 10)")
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("SUBSTRING(MD5({expr}), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("CONCAT_WS('|', {})", exprs.join(", "))
    }

    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            // MySQL has no native TABLESAMPLE; both system and bernoulli
            // sampling fall back to a probabilistic WHERE predicate.
            SamplingMethod::System | SamplingMethod::Bernoulli => {
                Some(format!("RAND() < {}", percent / 100.0))
            }
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("CAST({} AS CHAR)", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("(CRC32(CONCAT_WS('|', {concat})) % {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
