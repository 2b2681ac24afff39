use std::fmt::{Display, Formatter};

use wp_connector_api::{SinkReason, SinkResult};

/// 引擎侧的列逻辑类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    Char,
    Varchar,
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Binary,
    Json,
}

impl LogicalType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt
                | LogicalType::SmallInt
                | LogicalType::Int
                | LogicalType::BigInt
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Decimal { .. }
        )
    }
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalType::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            other => write!(f, "{}", format!("{other:?}").to_uppercase()),
        }
    }
}

/// 原始类型名 -> 逻辑类型，每个数据源各自实现
pub type RawTypeConverter = fn(&str) -> SinkResult<LogicalType>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowField {
    pub name: String,
    pub logical_type: LogicalType,
}

/// 有序的行结构描述，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowType {
    fields: Vec<RowField>,
}

impl RowType {
    pub fn create(
        names: &[String],
        types: &[String],
        converter: RawTypeConverter,
    ) -> SinkResult<Self> {
        if names.len() != types.len() {
            return Err(SinkReason::sink(format!(
                "column names ({}) and types ({}) differ in length",
                names.len(),
                types.len()
            ))
            .into());
        }
        if names.is_empty() {
            return Err(SinkReason::sink("row type requires at least one column").into());
        }
        let mut fields = Vec::with_capacity(names.len());
        for (name, raw) in names.iter().zip(types) {
            let name = name.trim();
            if name.is_empty() {
                return Err(SinkReason::sink("column name must not be empty").into());
            }
            let logical_type = converter(raw).map_err(|e| {
                SinkReason::sink(format!("column '{name}' has unsupported type: {e}"))
            })?;
            fields.push(RowField {
                name: name.to_string(),
                logical_type,
            });
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[RowField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
