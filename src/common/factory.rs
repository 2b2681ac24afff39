use wp_connector_api::{SinkHandle, SinkReason, SinkResult};
use wp_log::info_data;

use super::output::{OutputFormat, OutputFormatSink};
use super::row_type::RawTypeConverter;
use super::stream::{DataStream, DataStreamSink};

/// sink 工厂基类：负责把具体连接器挂到数据流上
pub trait StreamSinkFactory {
    /// 工厂类型名，小写后作为默认 sink 名
    fn class_name(&self) -> &'static str;

    fn create_output_named<'a>(
        &self,
        stream: &'a mut DataStream,
        output_format: Option<Box<dyn OutputFormat>>,
        sink_name: &str,
    ) -> SinkResult<&'a mut DataStreamSink>;

    fn create_output<'a>(
        &self,
        stream: &'a mut DataStream,
        output_format: Option<Box<dyn OutputFormat>>,
    ) -> SinkResult<&'a mut DataStreamSink> {
        let name = self.default_sink_name();
        self.create_output_named(stream, output_format, &name)
    }

    fn create_sink<'a>(&self, stream: &'a mut DataStream) -> SinkResult<&'a mut DataStreamSink>;

    fn raw_type_converter(&self) -> Option<RawTypeConverter>;

    fn default_sink_name(&self) -> String {
        self.class_name().to_lowercase()
    }
}

/// 只拒绝空名；名字内容由宿主自行约束
pub fn check_sink_name(sink_name: &str) -> SinkResult<()> {
    if sink_name.is_empty() {
        return Err(SinkReason::sink("invalid argument: sink name must not be empty").into());
    }
    Ok(())
}

/// 基于 OutputFormat 的默认挂载方式
pub fn default_output<'a>(
    stream: &'a mut DataStream,
    output_format: Option<Box<dyn OutputFormat>>,
    sink_name: &str,
) -> SinkResult<&'a mut DataStreamSink> {
    check_sink_name(sink_name)?;
    let Some(format) = output_format else {
        return Err(SinkReason::sink("invalid argument: output format must be provided").into());
    };
    info_data!(
        "[{}] add sink {} ({})",
        stream.stream_name(),
        sink_name,
        format.format_name()
    );
    let sink = OutputFormatSink::new(format, stream.task());
    let registered = stream.add_sink(SinkHandle::new(Box::new(sink)));
    registered.name(sink_name);
    Ok(registered)
}
