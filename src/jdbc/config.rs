use educe::Educe;
use orion_conf::error::{ConfIOReason, OrionConfResult};
use orion_error::{ToStructError, UvsFrom};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wp_conf_base::structure::Validate;
use wp_connector_api::{SinkReason, SinkResult};

use crate::common::{CommonConf, ParamMap};

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Insert,
    Update,
}

#[derive(Educe, Deserialize, Serialize, PartialEq, Clone)]
#[educe(Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JdbcConf {
    pub jdbc_url: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    #[educe(Debug(ignore))]
    pub password: String,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default)]
    pub unique_key: Vec<String>,
    #[serde(default)]
    pub pre_sql: Vec<String>,
    #[serde(default)]
    pub post_sql: Vec<String>,
    #[serde(flatten)]
    pub common: CommonConf,
}

impl JdbcConf {
    /// writer 参数 -> JdbcConf；兼容 `connection: [{jdbcUrl, table, schema}]` 嵌套写法
    pub fn from_params(params: &ParamMap) -> SinkResult<Self> {
        let mut flat: Map<String, Value> =
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if let Some(Value::Array(conns)) = flat.remove("connection")
            && let Some(Value::Object(conn)) = conns.into_iter().next()
        {
            for (key, value) in conn {
                let value = first_of(value);
                flat.entry(key).or_insert(value);
            }
        }
        serde_json::from_value(Value::Object(flat))
            .map_err(|e| SinkReason::sink(format!("parse jdbc conf fail: {e}")).into())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.common.column_names()
    }

    pub fn column_types(&self) -> Vec<String> {
        self.common.column_types()
    }
}

/// jdbcUrl / table 在任务描述里常以单元素数组出现
fn first_of(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

impl Validate for JdbcConf {
    fn validate(&self) -> OrionConfResult<()> {
        if self.jdbc_url.trim().is_empty() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("jdbc.jdbcUrl must not be empty")
                .err();
        }
        if self.table.trim().is_empty() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("jdbc.table must not be empty")
                .err();
        }
        if self.common.column.is_empty() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("jdbc.column must not be empty")
                .err();
        }
        if self.mode == WriteMode::Update && self.unique_key.is_empty() {
            return ConfIOReason::from_validation()
                .to_err()
                .with_detail("jdbc.uniqueKey is required in update mode")
                .err();
        }
        Ok(())
    }
}
