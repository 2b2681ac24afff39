use sea_orm::DatabaseBackend;
use wp_connector_api::SinkResult;

use super::config::JdbcConf;
use super::converter::{JdbcColumnConverter, RowConverter};
use crate::common::RowType;

/// 数据库方言：JdbcOutputFormat 通过它拿到连接串、语句拼装与列转换器
pub trait JdbcDialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn backend(&self) -> DatabaseBackend;

    fn quote_identifier(&self, ident: &str) -> String;

    /// jdbcUrl -> sea-orm 连接串
    fn database_url(&self, conf: &JdbcConf) -> SinkResult<String>;

    fn column_converter(&self, row_type: &RowType) -> Box<dyn RowConverter> {
        Box::new(JdbcColumnConverter::new(row_type.clone()))
    }

    fn qualified_table(&self, schema: Option<&str>, table: &str) -> String {
        match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            ),
            None => self.quote_identifier(table),
        }
    }

    fn insert_prefix(&self, schema: Option<&str>, table: &str, columns: &[String]) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ",
            self.qualified_table(schema, table),
            columns
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    /// None 表示方言不支持 upsert
    fn upsert_clause(&self, _unique_key: &[String], _columns: &[String]) -> Option<String> {
        None
    }
}
