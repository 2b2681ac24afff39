use wp_connector_api::{SinkHandle, SinkResult};
use wp_log::info_data;
use wp_model_core::model::DataRecord;

const UNNAMED_SINK: &str = "unnamed";

/// 当前并行实例在整个算子中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    pub index: usize,
    pub total: usize,
}

impl Default for TaskContext {
    fn default() -> Self {
        Self { index: 0, total: 1 }
    }
}

/// 流上挂载的一个具名 sink
pub struct DataStreamSink {
    name: String,
    handle: SinkHandle,
}

impl DataStreamSink {
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn sink_name(&self) -> &str {
        &self.name
    }

    pub fn handle_mut(&mut self) -> &mut SinkHandle {
        &mut self.handle
    }
}

/// 数据流：持有下游 sink 列表，并把记录扇出到每个 sink
pub struct DataStream {
    name: String,
    task: TaskContext,
    sinks: Vec<DataStreamSink>,
}

impl DataStream {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            task: TaskContext::default(),
            sinks: Vec::new(),
        }
    }

    pub fn with_task(mut self, index: usize, total: usize) -> Self {
        self.task = TaskContext { index, total };
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.name
    }

    pub fn task(&self) -> TaskContext {
        self.task
    }

    pub fn add_sink(&mut self, handle: SinkHandle) -> &mut DataStreamSink {
        let idx = self.sinks.len();
        self.sinks.push(DataStreamSink {
            name: UNNAMED_SINK.to_string(),
            handle,
        });
        &mut self.sinks[idx]
    }

    pub fn sinks(&self) -> &[DataStreamSink] {
        &self.sinks
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.sink_name()).collect()
    }

    pub async fn emit(&mut self, record: &DataRecord) -> SinkResult<()> {
        for sink in self.sinks.iter_mut() {
            sink.handle.sink.sink_record(record).await?;
        }
        Ok(())
    }

    pub async fn close(&mut self) -> SinkResult<()> {
        for sink in self.sinks.iter_mut() {
            info_data!("[{}] stop sink {}", self.name, sink.name);
            sink.handle.sink.stop().await?;
        }
        Ok(())
    }
}
