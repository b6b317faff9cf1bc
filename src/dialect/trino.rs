use super::{helpers, Dialect, SamplingMethod, ThreadingModel};
use crate::schema::SemanticClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct Trino;

impl Dialect for Trino {
    fn name(&self) -> &'static str {
        "trino"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn parse_type(&self, raw: &str) -> SemanticClass {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "varbinary" => SemanticClass::Binary,
            _ => helpers::parse_semantic_class(&s),
        }
    }

    fn normalize_number(&self, expr: &str, scale: u8) -> String {
        format!("CAST(ROUND({expr}, {scale}) AS VARCHAR)")
    }

    fn normalize_timestamp(&self, expr: &str, precision: u8, with_tz: bool) -> String {
        let expr = if with_tz {
            format!("{expr} AT TIME ZONE 'UTC'")
        } else {
            expr.to_string()
        };
        format!(
            "date_format({expr}, '%Y-%m-%d %H:%i:%S.{}')",
            "0".repeat(precision as usize)
        )
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(16);
        format!(
            "from_base(substr(to_hex(md5(to_utf8({expr}))), 1, {digits}), 16)"
        )
    }

    fn md5_as_hex(&self, expr: &str) -> String {
        let digits = (self.checksum_bits() / 4).max(1).min(32);
        format!("substr(to_hex(md5(to_utf8({expr}))), 1, {digits})")
    }

    fn concat(&self, exprs: &[String]) -> String {
        format!("array_join(array[{}], '|')", exprs.join(", "))
    }

    /// Trino has no native TABLESAMPLE percent control comparable across
    /// connectors uniformly, so both modes render as a `TABLESAMPLE BERNOULLI`
    /// fragment — the original implementation inflates the target percentage
    /// by 20% to compensate for its conservative estimator.
    fn sampling_clause(&self, method: SamplingMethod, percent: f64) -> Option<String> {
        match method {
            SamplingMethod::System | SamplingMethod::Bernoulli => {
                Some(format!("TABLESAMPLE BERNOULLI ({})", (percent * 1.2).min(100.0)))
            }
            SamplingMethod::Deterministic => None,
        }
    }

    fn deterministic_sample_predicate(&self, key_columns: &[String], modulus: u64) -> String {
        let concat = key_columns
            .iter()
            .map(|c| format!("CAST({} AS VARCHAR)", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(" || '|' || ");
        format!(
            "(from_base(substr(to_hex(xxhash64(to_utf8({concat}))), 1, 15), 16) % {modulus}) = 0"
        )
    }

    fn threading_model(&self) -> ThreadingModel {
        ThreadingModel::Threaded
    }
}
