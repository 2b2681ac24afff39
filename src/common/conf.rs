use educe::Educe;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use wp_connector_api::{SinkReason, SinkResult};

/// 插件参数表（与 `SinkSpec::params` 同构）
pub type ParamMap = BTreeMap<String, Value>;

/// 同步任务描述：`{"job": {"content": [...], "setting": {...}}}`
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SyncConf {
    pub job: JobConf,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct JobConf {
    pub content: Vec<ContentConf>,
    #[serde(default)]
    pub setting: SettingConf,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ContentConf {
    #[serde(default)]
    pub reader: Option<OperatorConf>,
    pub writer: OperatorConf,
}

/// reader / writer 节点：插件名 + 参数表
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct OperatorConf {
    pub name: String,
    #[serde(default)]
    pub parameter: ParamMap,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct SettingConf {
    #[serde(default)]
    pub speed: SpeedConf,
    #[serde(default, rename = "errorLimit")]
    pub error_limit: ErrorLimitConf,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeedConf {
    pub channel: i32,
    /// <= 0 表示沿用 channel
    pub writer_channel: i32,
    pub bytes: i64,
}

impl Default for SpeedConf {
    fn default() -> Self {
        Self {
            channel: 1,
            writer_channel: -1,
            bytes: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct ErrorLimitConf {
    pub record: i64,
}

impl SyncConf {
    pub fn parse_job(job: &str) -> SinkResult<Self> {
        let conf: SyncConf = serde_json::from_str(job)
            .map_err(|e| SinkReason::sink(format!("parse sync job fail: {e}")))?;
        if conf.job.content.is_empty() {
            return Err(SinkReason::sink("job.content must not be empty").into());
        }
        Ok(conf)
    }

    /// 仅含 writer 的任务，测试与直接构建 sink 时使用
    pub fn from_writer(name: &str, parameter: ParamMap) -> Self {
        Self {
            job: JobConf {
                content: vec![ContentConf {
                    reader: None,
                    writer: OperatorConf {
                        name: name.to_string(),
                        parameter,
                    },
                }],
                setting: SettingConf::default(),
            },
        }
    }

    pub fn writer(&self) -> SinkResult<&OperatorConf> {
        self.job
            .content
            .first()
            .map(|c| &c.writer)
            .ok_or_else(|| SinkReason::sink("job.content must not be empty").into())
    }

    pub fn speed(&self) -> &SpeedConf {
        &self.job.setting.speed
    }

    pub fn with_speed(mut self, channel: i32, writer_channel: i32) -> Self {
        self.job.setting.speed.channel = channel;
        self.job.setting.speed.writer_channel = writer_channel;
        self
    }
}

/// writer 的列定义；任务描述里既可写对象也可只写列名
#[derive(Debug, Serialize, PartialEq, Clone, Default)]
pub struct FieldConf {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub index: Option<i32>,
    pub value: Option<String>,
    pub format: Option<String>,
}

impl<'de> Deserialize<'de> for FieldConf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Full {
            name: String,
            #[serde(rename = "type", default)]
            field_type: String,
            #[serde(default)]
            index: Option<i32>,
            #[serde(default)]
            value: Option<String>,
            #[serde(default)]
            format: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full(Full),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => FieldConf {
                name,
                ..FieldConf::default()
            },
            Repr::Full(f) => FieldConf {
                name: f.name,
                field_type: f.field_type,
                index: f.index,
                value: f.value,
                format: f.format,
            },
        })
    }
}

/// 所有 sink 共享的配置项
#[derive(Educe, Deserialize, Serialize, PartialEq, Clone)]
#[educe(Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonConf {
    pub parallelism: Option<i32>,
    #[educe(Default = 1)]
    pub batch_size: usize,
    #[educe(Default = 10000)]
    pub flush_interval_mills: u64,
    pub column: Vec<FieldConf>,
    pub error_limit: Option<i64>,
}

impl CommonConf {
    pub fn column_names(&self) -> Vec<String> {
        self.column.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_types(&self) -> Vec<String> {
        self.column.iter().map(|c| c.field_type.clone()).collect()
    }
}

/// 从任务描述补全公共配置
pub fn init_common_conf(sync: &SyncConf, conf: &mut CommonConf) -> SinkResult<()> {
    let speed = sync.speed();
    let parallelism = if speed.writer_channel > 0 {
        speed.writer_channel
    } else {
        speed.channel
    };
    if parallelism > 0 {
        conf.parallelism = Some(parallelism);
    }
    if conf.column.is_empty()
        && let Some(raw) = sync.writer()?.parameter.get("column")
    {
        conf.column = parse_columns(raw)?;
    }
    if conf.batch_size == 0 {
        conf.batch_size = 1;
    }
    if conf.error_limit.is_none() && sync.job.setting.error_limit.record > 0 {
        conf.error_limit = Some(sync.job.setting.error_limit.record);
    }
    Ok(())
}

fn parse_columns(raw: &Value) -> SinkResult<Vec<FieldConf>> {
    if !raw.is_array() {
        return Err(SinkReason::sink("writer.column must be an array").into());
    }
    serde_json::from_value(raw.clone())
        .map_err(|e| SinkReason::sink(format!("invalid writer.column entry: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JOB: &str = r#"{
        "job": {
            "content": [{
                "writer": {
                    "name": "kafkawriter",
                    "parameter": {
                        "topic": "orders",
                        "column": [{"name": "id", "type": "int"}, "name"]
                    }
                }
            }],
            "setting": {"speed": {"channel": 2, "writerChannel": 3}}
        }
    }"#;

    #[test]
    fn parse_job_reads_writer_and_speed() {
        let sync = SyncConf::parse_job(JOB).expect("valid job");
        let writer = sync.writer().expect("writer");
        assert_eq!(writer.name, "kafkawriter");
        assert_eq!(writer.parameter.get("topic"), Some(&json!("orders")));
        assert_eq!(sync.speed().channel, 2);
        assert_eq!(sync.speed().writer_channel, 3);
    }

    #[test]
    fn parse_job_rejects_empty_content() {
        let err = SyncConf::parse_job(r#"{"job":{"content":[]}}"#).expect_err("empty content");
        assert!(format!("{err}").contains("job.content"));
    }

    #[test]
    fn common_conf_prefers_writer_channel_and_fills_columns() {
        let sync = SyncConf::parse_job(JOB).expect("valid job");
        let mut common = CommonConf::default();
        init_common_conf(&sync, &mut common).expect("init");
        assert_eq!(common.parallelism, Some(3));
        assert_eq!(common.column_names(), vec!["id", "name"]);
        assert_eq!(common.column_types(), vec!["int", ""]);
    }

    #[test]
    fn common_conf_keeps_typed_columns_and_falls_back_to_channel() {
        let mut params = ParamMap::new();
        params.insert("column".into(), json!(["ignored"]));
        let sync = SyncConf::from_writer("w", params).with_speed(4, -1);
        let mut common = CommonConf {
            column: vec![FieldConf {
                name: "kept".into(),
                field_type: "text".into(),
                ..FieldConf::default()
            }],
            batch_size: 0,
            ..CommonConf::default()
        };
        init_common_conf(&sync, &mut common).expect("init");
        assert_eq!(common.parallelism, Some(4));
        assert_eq!(common.column_names(), vec!["kept"]);
        assert_eq!(common.batch_size, 1);
    }

    #[test]
    fn field_conf_accepts_bare_names() {
        let fields: Vec<FieldConf> =
            serde_json::from_value(json!(["id", {"name": "ts", "type": "timestamp", "format": "yyyy"}]))
                .expect("columns");
        assert_eq!(fields[0].name, "id");
        assert!(fields[0].field_type.is_empty());
        assert_eq!(fields[1].field_type, "timestamp");
        assert_eq!(fields[1].format.as_deref(), Some("yyyy"));
        assert!(serde_json::from_value::<Vec<FieldConf>>(json!([1])).is_err());
    }

    #[test]
    fn common_conf_rejects_non_array_column() {
        let mut params = ParamMap::new();
        params.insert("column".into(), json!("id"));
        let sync = SyncConf::from_writer("w", params);
        let mut common = CommonConf::default();
        let err = init_common_conf(&sync, &mut common).expect_err("bad column");
        assert!(format!("{err}").contains("writer.column"));
    }
}
