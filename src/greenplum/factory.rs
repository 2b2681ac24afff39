use wp_conf_base::structure::Validate;
use wp_connector_api::{SinkReason, SinkResult};

use super::converter::greenplum_raw_type;
use super::output_format::GreenplumOutputFormat;
use crate::common::{
    DataStream, DataStreamSink, OutputFormat, RawTypeConverter, RowType, StreamSinkFactory,
    SyncConf, default_output, init_common_conf,
};
use crate::jdbc::JdbcConf;

pub struct GreenplumSinkFactory {
    conf: JdbcConf,
    row_type: RowType,
}

impl GreenplumSinkFactory {
    pub fn new(sync: &SyncConf) -> SinkResult<Self> {
        let mut conf = JdbcConf::from_params(&sync.writer()?.parameter)?;
        init_common_conf(sync, &mut conf.common)?;
        conf.validate()
            .map_err(|e| SinkReason::sink(format!("invalid greenplum conf: {e}")))?;
        // 列类型在挂载前确定，不等到连库之后才报错
        let row_type = RowType::create(
            &conf.column_names(),
            &conf.column_types(),
            greenplum_raw_type,
        )?;
        Ok(Self { conf, row_type })
    }

    pub fn conf(&self) -> &JdbcConf {
        &self.conf
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn output_format(&self) -> GreenplumOutputFormat {
        GreenplumOutputFormat::new(self.conf.clone())
    }
}

impl StreamSinkFactory for GreenplumSinkFactory {
    fn class_name(&self) -> &'static str {
        "GreenplumSinkFactory"
    }

    fn create_output_named<'a>(
        &self,
        stream: &'a mut DataStream,
        output_format: Option<Box<dyn OutputFormat>>,
        sink_name: &str,
    ) -> SinkResult<&'a mut DataStreamSink> {
        default_output(stream, output_format, sink_name)
    }

    fn create_sink<'a>(&self, stream: &'a mut DataStream) -> SinkResult<&'a mut DataStreamSink> {
        self.create_output(stream, Some(Box::new(self.output_format())))
    }

    fn raw_type_converter(&self) -> Option<RawTypeConverter> {
        Some(greenplum_raw_type)
    }
}
