use wp_connector_api::{SinkReason, SinkResult};

use crate::common::LogicalType;
use crate::jdbc::converter::to_hex;

const DEFAULT_DECIMAL_PRECISION: u8 = 38;
const DEFAULT_DECIMAL_SCALE: u8 = 18;

/// Greenplum（Postgres 系）列类型名 -> 逻辑类型
pub fn greenplum_raw_type(raw: &str) -> SinkResult<LogicalType> {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(SinkReason::sink("greenplum column type must not be empty").into());
    }
    if normalized.ends_with("[]") || normalized.starts_with('_') {
        return Err(SinkReason::sink(format!("greenplum array type '{raw}' is not supported")).into());
    }
    let (base, args) = split_type_args(&normalized);
    let ty = match base {
        "bool" | "boolean" => LogicalType::Boolean,
        "int2" | "smallint" | "smallserial" | "serial2" => LogicalType::SmallInt,
        "int" | "int4" | "integer" | "serial" | "serial4" => LogicalType::Int,
        "int8" | "bigint" | "bigserial" | "serial8" | "oid" => LogicalType::BigInt,
        "float4" | "real" => LogicalType::Float,
        "float" | "float8" | "double" | "double precision" | "money" => LogicalType::Double,
        "numeric" | "decimal" => decimal(args, raw)?,
        "char" | "character" | "bpchar" => LogicalType::Char,
        "varchar" | "character varying" => LogicalType::Varchar,
        "text" | "name" | "uuid" | "inet" | "cidr" | "macaddr" | "xml" | "interval" => {
            LogicalType::Text
        }
        "json" | "jsonb" => LogicalType::Json,
        "date" => LogicalType::Date,
        "time" | "time without time zone" | "timetz" | "time with time zone" => LogicalType::Time,
        "timestamp" | "timestamp without time zone" => LogicalType::Timestamp,
        "timestamptz" | "timestamp with time zone" => LogicalType::TimestampTz,
        "bytea" => LogicalType::Binary,
        _ => {
            return Err(SinkReason::sink(format!("unsupported greenplum type '{raw}'")).into());
        }
    };
    Ok(ty)
}

/// `varchar(32)` -> ("varchar", Some("32"))，`timestamp(3) with time zone` 保留修饰
fn split_type_args(normalized: &str) -> (&str, Option<&str>) {
    let Some(open) = normalized.find('(') else {
        return (normalized, None);
    };
    let Some(close) = normalized[open..].find(')').map(|i| open + i) else {
        return (normalized, None);
    };
    let head = normalized[..open].trim_end();
    let tail = normalized[close + 1..].trim();
    let args = Some(normalized[open + 1..close].trim());
    if tail.is_empty() {
        return (head, args);
    }
    // 带修饰的时间类型只需基础名
    match (head, tail) {
        ("timestamp", "with time zone") => ("timestamp with time zone", args),
        ("timestamp", "without time zone") => ("timestamp without time zone", args),
        ("time", "with time zone") => ("time with time zone", args),
        ("time", "without time zone") => ("time without time zone", args),
        _ => (head, args),
    }
}

fn decimal(args: Option<&str>, raw: &str) -> SinkResult<LogicalType> {
    let Some(args) = args else {
        return Ok(LogicalType::Decimal {
            precision: DEFAULT_DECIMAL_PRECISION,
            scale: DEFAULT_DECIMAL_SCALE,
        });
    };
    let invalid = || SinkReason::sink(format!("invalid numeric type '{raw}'"));
    let mut parts = args.split(',').map(str::trim);
    let precision: u8 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let scale: u8 = match parts.next() {
        Some(s) => s.parse().map_err(|_| invalid())?,
        None => 0,
    };
    if precision == 0 || scale > precision || parts.next().is_some() {
        return Err(invalid().into());
    }
    Ok(LogicalType::Decimal { precision, scale })
}

/// bytea 的十六进制字面量
pub fn bytea_literal(bytes: &[u8]) -> String {
    format!("'\\x{}'::bytea", to_hex(bytes))
}
