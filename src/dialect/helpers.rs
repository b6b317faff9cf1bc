//! Shared rendering and type-parsing helpers used by dialect implementations.
//!
//! `extract_parens` / `parse_decimal_params` mirror the teacher's
//! `sql::types::DataType::parse` family, retargeted from SQL `DataType` to
//! the diff engine's [`SemanticClass`](crate::schema::SemanticClass).

use crate::schema::SemanticClass;

pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Parse a backend type string (e.g. `"decimal(18,2)"`, `"varchar(255)"`,
/// `"timestamp(6) with time zone"`) into a [`SemanticClass`]. Unrecognized
/// types map to `SemanticClass::Unknown` rather than failing — the caller
/// decides whether that is fatal via `strict_type_checking`.
pub fn parse_semantic_class(raw: &str) -> SemanticClass {
    let s = raw.trim().to_lowercase();

    if let Some(inner) = extract_parens(&s, "decimal").or_else(|| extract_parens(&s, "numeric")) {
        if let Some((p, sc)) = parse_decimal_params(&inner) {
            return SemanticClass::Decimal {
                precision: p,
                scale: sc,
            };
        }
    }

    if s.starts_with("timestamp") || s.starts_with("datetime") {
        let with_tz = s.contains("with time zone") || s.contains("tz") || s.contains("timestamptz");
        let precision = extract_parens(&s, "timestamp")
            .or_else(|| extract_parens(&s, "datetime"))
            .and_then(|inner| inner.parse::<u8>().ok())
            .unwrap_or(6);
        return SemanticClass::Timestamp { precision, with_tz };
    }

    match s.as_str() {
        "bool" | "boolean" | "bit" => SemanticClass::Boolean,

        "tinyint" | "int8" | "smallint" | "int16" | "int2" | "int" | "integer" | "int32"
        | "int4" | "bigint" | "int64" | "serial" | "bigserial" => SemanticClass::Integer,

        "real" | "float4" | "float32" | "double" | "float8" | "float64" | "double precision"
        | "float" => SemanticClass::Float,

        "decimal" | "numeric" | "number" => SemanticClass::Decimal {
            precision: 38,
            scale: 9,
        },

        "text" | "string" | "clob" | "ntext" | "varchar" | "nvarchar" | "char" | "character" => {
            SemanticClass::Text {
                case_sensitive: true,
            }
        }

        "date" => SemanticClass::Date,

        "binary" | "blob" | "bytea" | "varbinary" | "image" => SemanticClass::Binary,

        "json" | "jsonb" | "variant" | "struct" | "object" => SemanticClass::Json,

        "uuid" | "guid" | "uniqueidentifier" => SemanticClass::Text {
            case_sensitive: false,
        },

        _ => {
            if s.starts_with("varchar") || s.starts_with("char") || s.starts_with("character") {
                SemanticClass::Text {
                    case_sensitive: true,
                }
            } else {
                SemanticClass::Unknown
            }
        }
    }
}

fn extract_parens(s: &str, prefix: &str) -> Option<String> {
    let s = s.trim();
    if !s.starts_with(prefix) {
        return None;
    }
    let rest = s[prefix.len()..].trim();
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    if open > close {
        return None;
    }
    Some(rest[open + 1..close].to_string())
}

fn parse_decimal_params(inner: &str) -> Option<(u8, u8)> {
    let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return None;
    }
    let precision: u8 = parts[0].parse().ok()?;
    let scale: u8 = parts[1].parse().ok()?;
    Some((precision, scale))
}
