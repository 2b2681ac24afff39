use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use wp_conf_base::structure::Validate;
use wp_connector_api::{SinkError, SinkReason, SinkResult};
use wp_log::info_data;
use wp_model_core::model::DataRecord;

use super::config::{JdbcConf, WriteMode};
use super::converter::RowConverter;
use super::dialect::JdbcDialect;
use crate::common::OutputFormat;

/// 通用 JDBC 输出：连接、批量 INSERT/UPSERT，列转换器由方言在 open 后安装
pub struct JdbcOutputFormat {
    conf: JdbcConf,
    dialect: Arc<dyn JdbcDialect>,
    db: Option<DatabaseConnection>,
    row_converter: Option<Box<dyn RowConverter>>,
    pending: Vec<String>,
    task_number: usize,
}

impl JdbcOutputFormat {
    pub fn new(conf: JdbcConf, dialect: Arc<dyn JdbcDialect>) -> Self {
        Self {
            conf,
            dialect,
            db: None,
            row_converter: None,
            pending: Vec::new(),
            task_number: 0,
        }
    }

    pub fn conf(&self) -> &JdbcConf {
        &self.conf
    }

    pub fn dialect(&self) -> &dyn JdbcDialect {
        self.dialect.as_ref()
    }

    pub fn set_row_converter(&mut self, converter: Box<dyn RowConverter>) {
        self.row_converter = Some(converter);
    }

    pub fn row_converter(&self) -> Option<&dyn RowConverter> {
        self.row_converter.as_deref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    pub fn check_conf(&self) -> SinkResult<()> {
        self.conf
            .validate()
            .map_err(|e| SinkReason::sink(format!("invalid jdbc conf: {e}")))?;
        if self.conf.mode == WriteMode::Update
            && self
                .dialect
                .upsert_clause(&self.conf.unique_key, &self.conf.column_names())
                .is_none()
        {
            return Err(SinkReason::sink(format!(
                "jdbc.mode=update is not supported by {}",
                self.dialect.name()
            ))
            .into());
        }
        Ok(())
    }

    /// 建立连接；task 0 额外执行 preSql
    pub async fn open_connection(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()> {
        check_task(task_number, num_tasks)?;
        self.check_conf()?;
        let url = self.dialect.database_url(&self.conf)?;
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(2)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(60))
            .sqlx_logging(false)
            .sqlx_logging_level(log::LevelFilter::Info);
        let db = Database::connect(opt).await.map_err(|err| {
            SinkError::from(SinkReason::sink(format!(
                "connect {} fail: {err}",
                self.dialect.name()
            )))
        })?;
        info_data!(
            "[{}] task {}/{} connected, table: {}",
            self.dialect.name(),
            task_number,
            num_tasks,
            self.conf.table
        );
        self.db = Some(db);
        self.task_number = task_number;
        if task_number == 0 {
            let pre_sql = self.conf.pre_sql.clone();
            self.execute_all(pre_sql).await?;
        }
        Ok(())
    }

    pub fn build_statement(&self, tuples: &[String]) -> SinkResult<String> {
        let columns = self.conf.column_names();
        let mut sql = self
            .dialect
            .insert_prefix(self.conf.schema.as_deref(), &self.conf.table, &columns);
        sql.push_str(&tuples.join(", "));
        if self.conf.mode == WriteMode::Update {
            let clause = self
                .dialect
                .upsert_clause(&self.conf.unique_key, &columns)
                .ok_or_else(|| {
                    SinkReason::sink(format!(
                        "jdbc.mode=update is not supported by {}",
                        self.dialect.name()
                    ))
                })?;
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok(sql)
    }

    /// 转换一条记录为 VALUES 元组
    pub fn format_tuple(&self, record: &DataRecord) -> SinkResult<String> {
        let converter = self.row_converter.as_ref().ok_or_else(|| {
            SinkReason::sink(format!("{} row converter not installed", self.dialect.name()))
        })?;
        let values = converter.to_external(record)?;
        Ok(format!("({})", values.join(", ")))
    }

    async fn execute_all(&self, sqls: Vec<String>) -> SinkResult<()> {
        if sqls.is_empty() {
            return Ok(());
        }
        let db = self.connection()?;
        for sql in sqls {
            info_data!("[{}] execute: {}", self.dialect.name(), sql);
            let state = Statement::from_string(self.dialect.backend(), sql);
            db.execute(state).await.map_err(|e| {
                SinkError::from(SinkReason::Sink(format!(
                    "{} execute fail: {}",
                    self.dialect.name(),
                    e
                )))
            })?;
        }
        Ok(())
    }

    fn connection(&self) -> SinkResult<&DatabaseConnection> {
        self.db.as_ref().ok_or_else(|| {
            SinkReason::sink(format!("{} connection is not open", self.dialect.name())).into()
        })
    }
}

pub fn check_task(task_number: usize, num_tasks: usize) -> SinkResult<()> {
    if task_number >= num_tasks {
        return Err(SinkReason::sink(format!(
            "invalid argument: task index {task_number} out of range [0, {num_tasks})"
        ))
        .into());
    }
    Ok(())
}

#[async_trait]
impl OutputFormat for JdbcOutputFormat {
    fn format_name(&self) -> &str {
        self.dialect.name()
    }

    async fn open(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()> {
        self.open_connection(task_number, num_tasks).await
    }

    async fn write_record(&mut self, record: &DataRecord) -> SinkResult<()> {
        let tuple = self.format_tuple(record)?;
        self.pending.push(tuple);
        if self.pending.len() >= self.conf.common.batch_size.max(1) {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> SinkResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // 失败的批次直接丢弃，不与后续记录一起重试
        let batch = std::mem::take(&mut self.pending);
        let sql = self.build_statement(&batch)?;
        let state = Statement::from_string(self.dialect.backend(), sql);
        self.connection()?.execute(state).await.map_err(|e| {
            SinkError::from(SinkReason::Sink(format!(
                "{} exec {} rows, columns:{:?}, fail: {}",
                self.dialect.name(),
                batch.len(),
                self.conf.column_names(),
                e
            )))
        })?;
        Ok(())
    }

    async fn close(&mut self) -> SinkResult<()> {
        if self.db.is_none() {
            return Ok(());
        }
        self.flush().await?;
        if self.task_number == 0 {
            let post_sql = self.conf.post_sql.clone();
            self.execute_all(post_sql).await?;
        }
        self.db = None;
        Ok(())
    }

    async fn reconnect(&mut self) -> SinkResult<()> {
        self.connection()?.ping().await.map_err(|e| {
            SinkError::from(SinkReason::Sink(format!(
                "reconnect {} fail: {}",
                self.dialect.name(),
                e
            )))
        })?;
        Ok(())
    }
}
