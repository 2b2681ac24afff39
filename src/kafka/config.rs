use std::collections::BTreeMap;

use educe::Educe;
use orion_conf::error::{ConfIOReason, OrionConfResult};
use orion_error::{ToStructError, UvsFrom};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wp_conf_base::structure::Validate;
use wp_connector_api::{SinkReason, SinkResult};

use super::startup::StartupMode;
use crate::common::{CommonConf, ParamMap};

pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";

/// 允许的文本编码；json 以外交给 wp-data-fmt
pub const CODECS: [&str; 6] = ["json", "csv", "kv", "raw", "show", "proto-text"];

#[derive(Educe, Deserialize, Serialize, PartialEq, Clone)]
#[educe(Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConf {
    pub topic: String,
    #[serde(default)]
    pub producer_settings: BTreeMap<String, String>,
    #[serde(default)]
    pub mode: StartupMode,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default = "default_codec")]
    #[educe(Default = "json")]
    pub codec: String,
    #[serde(default)]
    /// 作为消息 key 的列，按顺序拼接
    pub partition_assign_columns: Vec<String>,
    #[serde(flatten)]
    pub common: CommonConf,
}

fn default_codec() -> String {
    "json".to_string()
}

impl KafkaConf {
    pub fn new(topic: &str, brokers: &str) -> Self {
        let mut conf = Self {
            topic: topic.to_string(),
            ..Self::default()
        };
        conf.producer_settings
            .insert(BOOTSTRAP_SERVERS.to_string(), brokers.to_string());
        conf
    }

    pub fn brokers(&self) -> Option<&str> {
        self.producer_settings
            .get(BOOTSTRAP_SERVERS)
            .map(String::as_str)
            .filter(|b| !b.trim().is_empty())
    }
}

impl Validate for KafkaConf {
    fn validate(&self) -> OrionConfResult<()> {
        if self.topic.trim().is_empty() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("kafka.topic must not be empty")
                .err();
        }
        if self.brokers().is_none() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("kafka.producerSettings must contain bootstrap.servers")
                .err();
        }
        if !CODECS.contains(&self.codec.as_str()) {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail(&format!(
                    "invalid codec: '{}'; allowed: json,csv,kv,raw,show,proto-text",
                    self.codec
                ))
                .err();
        }
        if self.mode == StartupMode::Timestamp && self.timestamp.is_none() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("kafka.timestamp is required in timestamp mode")
                .err();
        }
        Ok(())
    }
}

/// writer 参数表 -> KafkaConf；每个工厂各自构造，不共享状态
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsDecoder;

impl SettingsDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, params: &ParamMap) -> SinkResult<KafkaConf> {
        let mut object: Map<String, Value> =
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if let Some(settings) = object.get_mut("producerSettings") {
            stringify_values("producerSettings", settings)?;
        }
        serde_json::from_value(Value::Object(object))
            .map_err(|e| SinkReason::sink(format!("parse kafka conf fail: {e}")).into())
    }
}

/// 客户端参数统一为字符串（如 `"retries": 3` -> `"3"`）
fn stringify_values(key: &str, settings: &mut Value) -> SinkResult<()> {
    let Value::Object(map) = settings else {
        return Err(SinkReason::sink(format!("kafka.{key} must be an object")).into());
    };
    for value in map.values_mut() {
        let text = match value {
            Value::String(_) => continue,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(SinkReason::sink(format!("kafka.{key} values must be scalar")).into());
            }
        };
        *value = Value::String(text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ParamMap {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn decode_reads_settings_and_mode() {
        let conf = SettingsDecoder::new()
            .decode(&params(json!({
                "topic": "orders",
                "producerSettings": {"bootstrap.servers": "k1:9092", "retries": 3, "enable.idempotence": true},
                "mode": "LATEST",
                "batchSize": 10
            })))
            .expect("valid conf");
        assert_eq!(conf.topic, "orders");
        assert_eq!(conf.mode, StartupMode::Latest);
        assert_eq!(conf.brokers(), Some("k1:9092"));
        assert_eq!(
            conf.producer_settings.get("retries").map(String::as_str),
            Some("3")
        );
        assert_eq!(
            conf.producer_settings
                .get("enable.idempotence")
                .map(String::as_str),
            Some("true")
        );
        assert_eq!(conf.codec, "json");
        assert_eq!(conf.common.batch_size, 10);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn decode_reads_partition_assign_columns() {
        let conf = SettingsDecoder::new()
            .decode(&params(json!({
                "topic": "orders",
                "producerSettings": {"bootstrap.servers": "k1:9092"},
                "partitionAssignColumns": ["region", "id"]
            })))
            .expect("valid conf");
        assert_eq!(conf.partition_assign_columns, vec!["region", "id"]);
    }

    #[test]
    fn decode_rejects_unknown_mode() {
        let err = SettingsDecoder::new()
            .decode(&params(json!({"topic": "orders", "mode": "newest"})))
            .expect_err("unknown mode");
        let msg = format!("{err}");
        assert!(msg.contains("parse kafka conf fail"));
        assert!(msg.contains("newest"));
    }

    #[test]
    fn decode_rejects_nested_setting_values() {
        let err = SettingsDecoder::new()
            .decode(&params(json!({
                "topic": "orders",
                "producerSettings": {"bootstrap.servers": ["k1"]}
            })))
            .expect_err("array value");
        assert!(format!("{err}").contains("kafka.producerSettings values must be scalar"));
    }

    #[test]
    fn validate_requires_brokers_and_known_codec() {
        let mut conf = KafkaConf::new("orders", "k1:9092");
        assert!(conf.validate().is_ok());

        conf.codec = "xml".into();
        assert!(conf.validate().is_err());

        let no_brokers = KafkaConf {
            topic: "orders".into(),
            ..KafkaConf::default()
        };
        assert!(no_brokers.validate().is_err());
    }

    #[test]
    fn timestamp_mode_requires_timestamp() {
        let mut conf = KafkaConf::new("orders", "k1:9092");
        conf.mode = StartupMode::Timestamp;
        assert!(conf.validate().is_err());
        conf.timestamp = Some(1_700_000_000_000);
        assert!(conf.validate().is_ok());
    }
}
