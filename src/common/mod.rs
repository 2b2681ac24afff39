//! 各 sink 连接器共享的宿主接口
//!
//! - conf：同步任务描述与公共配置
//! - stream：DataStream / DataStreamSink
//! - output：OutputFormat 及其 sink 适配
//! - row_type：行结构描述
//! - factory：sink 工厂基类

pub mod conf;
pub mod factory;
pub mod output;
pub mod row_type;
pub mod stream;

pub use conf::{CommonConf, FieldConf, ParamMap, SyncConf, init_common_conf};
pub use factory::{StreamSinkFactory, check_sink_name, default_output};
pub use output::{OutputFormat, OutputFormatSink};
pub use row_type::{LogicalType, RawTypeConverter, RowField, RowType};
pub use stream::{DataStream, DataStreamSink, TaskContext};
