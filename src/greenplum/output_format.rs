use std::sync::Arc;

use async_trait::async_trait;
use wp_connector_api::SinkResult;
use wp_log::info_data;
use wp_model_core::model::DataRecord;

use super::converter::greenplum_raw_type;
use super::dialect::GreenplumDialect;
use crate::common::{OutputFormat, RowType};
use crate::jdbc::{JdbcConf, JdbcOutputFormat, RowConverter};

/// Greenplum 输出：通用 JDBC 输出 + Greenplum 方言与类型映射
pub struct GreenplumOutputFormat {
    inner: JdbcOutputFormat,
}

impl GreenplumOutputFormat {
    pub fn new(conf: JdbcConf) -> Self {
        Self {
            inner: JdbcOutputFormat::new(conf, Arc::new(GreenplumDialect)),
        }
    }

    pub async fn open_internal(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()> {
        self.inner.open_connection(task_number, num_tasks).await?;
        self.install_row_converter()
    }

    /// 由配置的列名/列类型推导行结构，并安装方言提供的列转换器
    pub fn install_row_converter(&mut self) -> SinkResult<()> {
        let row_type = RowType::create(
            &self.inner.conf().column_names(),
            &self.inner.conf().column_types(),
            greenplum_raw_type,
        )?;
        info_data!("[greenplum] row type: {:?}", row_type.field_names());
        let converter = self.inner.dialect().column_converter(&row_type);
        self.inner.set_row_converter(converter);
        Ok(())
    }

    pub fn row_converter(&self) -> Option<&dyn RowConverter> {
        self.inner.row_converter()
    }

    pub fn jdbc(&self) -> &JdbcOutputFormat {
        &self.inner
    }
}

#[async_trait]
impl OutputFormat for GreenplumOutputFormat {
    fn format_name(&self) -> &str {
        self.inner.format_name()
    }

    async fn open(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()> {
        self.open_internal(task_number, num_tasks).await
    }

    async fn write_record(&mut self, record: &DataRecord) -> SinkResult<()> {
        self.inner.write_record(record).await
    }

    async fn flush(&mut self) -> SinkResult<()> {
        self.inner.flush().await
    }

    async fn close(&mut self) -> SinkResult<()> {
        self.inner.close().await
    }

    async fn reconnect(&mut self) -> SinkResult<()> {
        self.inner.reconnect().await
    }
}
