use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

impl Dialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "number" => SemanticClass::Decimal {
                precision: 38,
                scale: 9,
            },
            "varchar2" | "nvarchar2" | "clob" => SemanticClass::Text {
                case_sensitive: true,
            },
            "raw" => SemanticClass::Binary,
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("TO_CHAR(ROUND({expr}, {scale}))")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let _ = with_tz;
        format!("TO_CHAR({expr}, 'YYYY-MM-DD HH24:MI:SS.{}')", "F".repeat(precision.max(1) as usize))
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!(
            "TO_NUMBER(SUBSTR(RAWTOHEX(STANDARD_HASH({expr}, 'MD5')), 1, {digits}), 'XXXXXXXXXXXXXXXX')"
        )
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("SUBSTR(RAWTOHEX(STANDARD_HASH({expr}, 'MD5')), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        exprs.join(" || '|' || ")
    }

    /// Oracle uses bare `SAMPLE(pct)`, not `TABLESAMPLE`.
    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System | SamplingMethod::Bernoulli => Some(format!("SAMPLE({percent})")),
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("TO_CHAR({})", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(" || '|' || ");
        format!("MOD(ORA_HASH({concat}), {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::SingleConnection
    }
}
