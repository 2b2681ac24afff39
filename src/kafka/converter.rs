use serde_json::{Map, Value as JsonValue};
use wp_connector_api::{SinkReason, SinkResult};
use wp_data_fmt::{DataFormat, FormatType};
use wp_model_core::model::{DataRecord, DataType, Value, fmt_def::TextFmt};

use super::config::KafkaConf;

enum Codec {
    Json,
    Text(TextFmt),
}

const KEY_SEPARATOR: &str = ",";

/// 记录 -> 消息体；json 编码按配置列输出对象，其余编码走 wp-data-fmt
pub struct KafkaColumnConverter {
    columns: Vec<String>,
    key_columns: Vec<String>,
    codec: Codec,
}

impl KafkaColumnConverter {
    pub fn new(conf: &KafkaConf) -> Self {
        let codec = match conf.codec.trim() {
            "" | "json" => Codec::Json,
            other => Codec::Text(TextFmt::from(other)),
        };
        Self {
            columns: conf.common.column_names(),
            key_columns: conf.partition_assign_columns.clone(),
            codec,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// partitionAssignColumns 的值以逗号拼接；未配置时为空 key，由客户端分区器决定
    pub fn message_key(&self, record: &DataRecord) -> Vec<u8> {
        if self.key_columns.is_empty() {
            return Vec::new();
        }
        self.key_columns
            .iter()
            .map(|col| {
                record
                    .items
                    .iter()
                    .find(|f| f.get_name() == col.as_str() && *f.get_meta() != DataType::Ignore)
                    .map(|f| f.get_value().to_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
            .into_bytes()
    }

    /// 未配置列时输出全部非忽略字段；配置列缺失的字段写 null
    pub fn to_json(&self, record: &DataRecord) -> Map<String, JsonValue> {
        let fields = record
            .items
            .iter()
            .filter(|f| *f.get_meta() != DataType::Ignore);
        let mut out = Map::new();
        if self.columns.is_empty() {
            for field in fields {
                out.insert(field.get_name().to_string(), to_json_value(field.get_value()));
            }
            return out;
        }
        let found: Vec<_> = fields.collect();
        for col in &self.columns {
            let value = found
                .iter()
                .find(|f| f.get_name() == col.as_str())
                .map(|f| to_json_value(f.get_value()))
                .unwrap_or(JsonValue::Null);
            out.insert(col.clone(), value);
        }
        out
    }

    pub fn convert(&self, record: &DataRecord) -> SinkResult<Vec<u8>> {
        match &self.codec {
            Codec::Json => serde_json::to_vec(&self.to_json(record)).map_err(|e| {
                SinkReason::sink(format!("encode kafka json message fail: {e}")).into()
            }),
            Codec::Text(fmt) => {
                let fmt = FormatType::from(fmt);
                Ok(fmt.format_record(record).to_string().into_bytes())
            }
        }
    }
}

fn to_json_value(value: &Value) -> JsonValue {
    match value {
        Value::Digit(d) => JsonValue::from(*d),
        Value::Chars(s) => JsonValue::String(s.to_string()),
        other => JsonValue::String(other.to_string()),
    }
}
