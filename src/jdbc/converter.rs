use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use wp_connector_api::{SinkReason, SinkResult};
use wp_log::error_data;
use wp_model_core::model::{DataRecord, DataType};

use crate::common::{LogicalType, RowType};

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// 引擎记录 -> 目标端列值
pub trait RowConverter: Send + Sync {
    fn row_type(&self) -> &RowType;

    /// 按 row_type 的列顺序输出 SQL 字面量
    fn to_external(&self, record: &DataRecord) -> SinkResult<Vec<String>>;
}

pub type BinaryLiteral = fn(&[u8]) -> String;

/// 标准 SQL 的十六进制写法
pub fn standard_binary_literal(bytes: &[u8]) -> String {
    format!("X'{}'", to_hex(bytes))
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub struct JdbcColumnConverter {
    row_type: RowType,
    binary_literal: BinaryLiteral,
}

impl JdbcColumnConverter {
    pub fn new(row_type: RowType) -> Self {
        Self {
            row_type,
            binary_literal: standard_binary_literal,
        }
    }

    pub fn with_binary_literal(mut self, binary_literal: BinaryLiteral) -> Self {
        self.binary_literal = binary_literal;
        self
    }

    fn render(&self, name: &str, ty: LogicalType, raw: &str) -> SinkResult<String> {
        let trimmed = raw.trim();
        let invalid = || {
            SinkReason::sink(format!(
                "column '{name}' expects {ty}, got '{}'",
                truncate(raw)
            ))
        };
        let literal = match ty {
            LogicalType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" => "TRUE".to_string(),
                "false" | "f" | "0" | "no" | "n" => "FALSE".to_string(),
                _ => return Err(invalid().into()),
            },
            LogicalType::TinyInt | LogicalType::SmallInt | LogicalType::Int | LogicalType::BigInt => {
                let v: i64 = trimmed.parse().map_err(|_| invalid())?;
                check_int_range(ty, v).ok_or_else(invalid)?;
                v.to_string()
            }
            LogicalType::Float | LogicalType::Double | LogicalType::Decimal { .. } => {
                let v: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !v.is_finite() {
                    return Err(invalid().into());
                }
                trimmed.to_string()
            }
            LogicalType::Char | LogicalType::Varchar | LogicalType::Text | LogicalType::Json => {
                quote(raw)
            }
            LogicalType::Date => {
                let d = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?;
                quote(&d.format("%Y-%m-%d").to_string())
            }
            LogicalType::Time => {
                let t = NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f").map_err(|_| invalid())?;
                quote(&t.format("%H:%M:%S%.f").to_string())
            }
            LogicalType::Timestamp => {
                let ts = parse_timestamp(trimmed).ok_or_else(invalid)?;
                quote(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            LogicalType::TimestampTz => {
                let ts = DateTime::parse_from_rfc3339(trimmed)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| parse_timestamp(trimmed).map(|naive| naive.and_utc()))
                    .ok_or_else(invalid)?;
                quote(&ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
            }
            LogicalType::Binary => (self.binary_literal)(raw.as_bytes()),
        };
        Ok(literal)
    }
}

impl RowConverter for JdbcColumnConverter {
    fn row_type(&self) -> &RowType {
        &self.row_type
    }

    fn to_external(&self, record: &DataRecord) -> SinkResult<Vec<String>> {
        let field_map: HashMap<&str, String> = record
            .items
            .iter()
            .filter(|f| *f.get_meta() != DataType::Ignore)
            .map(|f| (f.get_name(), f.get_value().to_string()))
            .collect();
        let mut values = Vec::with_capacity(self.row_type.len());
        for field in self.row_type.fields() {
            match field_map.get(field.name.as_str()) {
                Some(raw) => values.push(self.render(&field.name, field.logical_type, raw)?),
                None => {
                    error_data!("Warning: Missing field for column '{}'", field.name);
                    values.push("NULL".to_string());
                }
            }
        }
        Ok(values)
    }
}

fn check_int_range(ty: LogicalType, v: i64) -> Option<()> {
    let ok = match ty {
        LogicalType::TinyInt => i8::try_from(v).is_ok(),
        LogicalType::SmallInt => i16::try_from(v).is_ok(),
        LogicalType::Int => i32::try_from(v).is_ok(),
        _ => true,
    };
    ok.then_some(())
}

/// 文本时间或毫秒时间戳
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

fn quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

fn truncate(raw: &str) -> String {
    const MAX: usize = 64;
    if raw.chars().count() <= MAX {
        return raw.to_string();
    }
    let head: String = raw.chars().take(MAX).collect();
    format!("{head}...")
}
