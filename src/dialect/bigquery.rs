use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct BigQuery;

impl Dialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "\\`"))
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "int64" => SemanticClass::Integer,
            "float64" => SemanticClass::Float,
            "bignumeric" | "numeric" => SemanticClass::Decimal {
                precision: 38,
                scale: 9,
            },
            "bool" => SemanticClass::Boolean,
            "timestamp" => SemanticClass::Timestamp {
                precision: 6,
                with_tz: true,
            },
            "datetime" => SemanticClass::Timestamp {
                precision: 6,
                with_tz: false,
            },
            "string" => SemanticClass::Text {
                case_sensitive: true,
            },
            "bytes" => SemanticClass::Binary,
            "json" => SemanticClass::Json,
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("CAST(ROUND({expr}, {scale}) AS STRING)")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let _ = with_tz;
        format!(
            "FORMAT_TIMESTAMP('%Y-%m-%d %H:%M:%E{}S', {expr})",
            precision
        )
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("LOWER({expr})")
    }

    fn normalize_json(&self, expr: &str) -> String {
        format!("TO_JSON_STRING({expr})")
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(16);
        format!(
            "CAST(CONCAT('0x', SUBSTR(TO_HEX(MD5({expr})), 1, {digits})) AS INT64)"
        )
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("SUBSTR(TO_HEX(MD5({expr})), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("ARRAY_TO_STRING([{}], '|')", exprs.join(", "))
    }

    fn sum_checksum(&self, md5_int_expr: &str) -> String {
        format!("SUM(CAST({md5_int_expr} AS BIGNUMERIC))")
    }

    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System => Some(format!("TABLESAMPLE SYSTEM ({percent} PERCENT)")),
            SamplingMethod::Bernoulli => Some(format!("TABLESAMPLE BERNOULLI ({percent} PERCENT)")),
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("CAST({} AS STRING)", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(" || '|' || ");
        format!("MOD(ABS(FARM_FINGERPRINT({concat})), {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
