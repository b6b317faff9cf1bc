use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct Snowflake;

impl Dialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "variant" | "object" | "array" => SemanticClass::Json,
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("TO_VARCHAR(ROUND({expr}, {scale}))")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let expr = if with_tz {
            format!("CONVERT_TIMEZONE('UTC', {expr})")
        } else {
            expr.to_string()
        };
        format!("TO_VARCHAR({expr}, 'YYYY-MM-DD HH24:MI:SS.{}')", "F".repeat(precision as usize))
    }

    fn md5_as_int(&self, expr: &str) -> String {
        format!("TO_NUMBER(MD5_HEX({expr}), 'XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX')")
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("SUBSTR(MD5_HEX({expr}), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("ARRAY_TO_STRING(ARRAY_CONSTRUCT({}), '|')", exprs.join(", "))
    }

    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System => Some(format!("SAMPLE SYSTEM ({percent})")),
            SamplingMethod::Bernoulli => Some(format!("SAMPLE BERNOULLI ({percent})")),
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("TO_VARCHAR({})", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(" || '|' || ");
        format!("(ABS(HASH({concat})) % {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
