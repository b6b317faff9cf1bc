use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "uuid" => SemanticClass::Text {
                case_sensitive: false,
            },
            "timestamptz" => SemanticClass::Timestamp {
                precision: 6,
                with_tz: true,
            },
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("ROUND({expr}::numeric, {scale})::text")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let expr = if with_tz {
            format!("{expr} AT TIME ZONE 'UTC'")
        } else {
            expr.to_string()
        };
        format!("to_char({expr}, 'YYYY-MM-DD HH24:MI:SS.{}')", "F".repeat(precision as usize))
    }

    fn normalize_boolean(&self, expr: &str) -> String {
        format!("CASE WHEN {expr} THEN '1' ELSE '0' END")
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("lower({expr}::text)")
    }

    fn normalize_json(&self, expr: &str) -> String {
        format!("{expr}::text")
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("('x' || substr(md5({expr}), 1, {digits}))::bit({})::bigint::numeric", digits * 4)
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("substr(md5({expr}), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("concat_ws('|', {})", exprs.join(", "))
    }

    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System => Some(format!("TABLESAMPLE SYSTEM ({percent})")),
            SamplingMethod::Bernoulli => Some(format!("TABLESAMPLE BERNOULLI ({percent})")),
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("{}::text", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(" || ");
        format!("(abs(hashtext({concat})) % {modulus}) = 0")
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
