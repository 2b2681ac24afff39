use std::sync::Arc;

use async_trait::async_trait;
use wp_connector_api::{
    AsyncCtrl, AsyncRawDataSink, AsyncRecordSink, SinkError, SinkReason, SinkResult,
};
use wp_model_core::model::DataRecord;

use super::stream::TaskContext;

/// 逐条写出的输出格式：open -> write_record* -> close
#[async_trait]
pub trait OutputFormat: Send + Sync {
    fn format_name(&self) -> &str;

    async fn open(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()>;

    async fn write_record(&mut self, record: &DataRecord) -> SinkResult<()>;

    async fn flush(&mut self) -> SinkResult<()>;

    async fn close(&mut self) -> SinkResult<()>;

    async fn reconnect(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

/// 把 OutputFormat 包装成 sink；首条记录到达时才 open
pub struct OutputFormatSink {
    format: Box<dyn OutputFormat>,
    task: TaskContext,
    opened: bool,
}

impl OutputFormatSink {
    pub fn new(format: Box<dyn OutputFormat>, task: TaskContext) -> Self {
        Self {
            format,
            task,
            opened: false,
        }
    }

    async fn ensure_open(&mut self) -> SinkResult<()> {
        if !self.opened {
            self.format.open(self.task.index, self.task.total).await?;
            self.opened = true;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncCtrl for OutputFormatSink {
    async fn stop(&mut self) -> SinkResult<()> {
        if !self.opened {
            return Ok(());
        }
        self.opened = false;
        self.format.close().await
    }
    async fn reconnect(&mut self) -> SinkResult<()> {
        if !self.opened {
            return self.ensure_open().await;
        }
        self.format.reconnect().await
    }
}

#[async_trait]
impl AsyncRecordSink for OutputFormatSink {
    async fn sink_record(&mut self, data: &DataRecord) -> SinkResult<()> {
        self.ensure_open().await?;
        self.format.write_record(data).await
    }

    async fn sink_records(&mut self, data: Vec<Arc<DataRecord>>) -> SinkResult<()> {
        self.ensure_open().await?;
        for record in data {
            self.format.write_record(record.as_ref()).await?;
        }
        self.format.flush().await
    }
}

#[async_trait]
impl AsyncRawDataSink for OutputFormatSink {
    async fn sink_str(&mut self, _data: &str) -> SinkResult<()> {
        Err(SinkError::from(SinkReason::Sink(format!(
            "{} does not accept raw input",
            self.format.format_name()
        ))))
    }
    async fn sink_bytes(&mut self, _data: &[u8]) -> SinkResult<()> {
        Err(SinkError::from(SinkReason::Sink(format!(
            "{} does not accept raw bytes",
            self.format.format_name()
        ))))
    }

    async fn sink_str_batch(&mut self, _data: Vec<&str>) -> SinkResult<()> {
        Err(SinkError::from(SinkReason::Sink(format!(
            "{} does not accept raw input",
            self.format.format_name()
        ))))
    }
    async fn sink_bytes_batch(&mut self, _data: Vec<&[u8]>) -> SinkResult<()> {
        Err(SinkError::from(SinkReason::Sink(format!(
            "{} does not accept raw bytes",
            self.format.format_name()
        ))))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// 记录生命周期调用顺序
    #[derive(Clone, Default)]
    pub(crate) struct TraceFormat {
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl OutputFormat for TraceFormat {
        fn format_name(&self) -> &str {
            "trace"
        }
        async fn open(&mut self, task_number: usize, num_tasks: usize) -> SinkResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("open {task_number}/{num_tasks}"));
            Ok(())
        }
        async fn write_record(&mut self, _record: &DataRecord) -> SinkResult<()> {
            self.calls.lock().unwrap().push("write".into());
            Ok(())
        }
        async fn flush(&mut self) -> SinkResult<()> {
            self.calls.lock().unwrap().push("flush".into());
            Ok(())
        }
        async fn close(&mut self) -> SinkResult<()> {
            self.calls.lock().unwrap().push("close".into());
            Ok(())
        }
    }
}
