use wp_conf_base::structure::Validate;
use wp_connector_api::{SinkHandle, SinkReason, SinkResult};
use wp_log::info_data;

use crate::common::{
    DataStream, DataStreamSink, OutputFormat, RawTypeConverter, StreamSinkFactory, SyncConf,
    check_sink_name, init_common_conf,
};
use crate::kafka::config::{KafkaConf, SettingsDecoder};
use crate::kafka::converter::KafkaColumnConverter;
use crate::kafka::producer::{
    DEFAULT_KAFKA_PRODUCERS_POOL_SIZE, KafkaProducer, Properties, Semantic,
};
use crate::kafka::serialization::RowSerializationSchema;

pub struct KafkaSinkFactory {
    conf: KafkaConf,
}

impl KafkaSinkFactory {
    pub fn new(sync: &SyncConf) -> SinkResult<Self> {
        let decoder = SettingsDecoder::new();
        let mut conf = decoder.decode(&sync.writer()?.parameter)?;
        init_common_conf(sync, &mut conf.common)?;
        conf.validate()
            .map_err(|e| SinkReason::sink(format!("invalid kafka conf: {e}")))?;
        Ok(Self { conf })
    }

    pub fn conf(&self) -> &KafkaConf {
        &self.conf
    }

    /// topic + 序列化器 + 客户端参数，投递语义固定为 at-least-once
    pub fn build_producer(&self) -> SinkResult<KafkaProducer> {
        let mut props = Properties::new();
        props.extend(self.conf.producer_settings.clone());
        let schema = RowSerializationSchema::new(
            &self.conf.topic,
            KafkaColumnConverter::new(&self.conf),
        );
        KafkaProducer::new(
            &self.conf.topic,
            schema,
            props,
            Semantic::AtLeastOnce,
            DEFAULT_KAFKA_PRODUCERS_POOL_SIZE,
        )
    }
}

impl StreamSinkFactory for KafkaSinkFactory {
    fn class_name(&self) -> &'static str {
        "KafkaSinkFactory"
    }

    // kafka 直接写 producer，不经过 OutputFormat
    fn create_output_named<'a>(
        &self,
        stream: &'a mut DataStream,
        _output_format: Option<Box<dyn OutputFormat>>,
        sink_name: &str,
    ) -> SinkResult<&'a mut DataStreamSink> {
        check_sink_name(sink_name)?;
        let producer = self.build_producer()?;
        info_data!(
            "[{}] add sink {} -> kafka topic {}",
            stream.stream_name(),
            sink_name,
            self.conf.topic
        );
        let sink = stream.add_sink(SinkHandle::new(Box::new(producer)));
        sink.name(sink_name);
        Ok(sink)
    }

    fn create_sink<'a>(&self, stream: &'a mut DataStream) -> SinkResult<&'a mut DataStreamSink> {
        self.create_output(stream, None)
    }

    fn raw_type_converter(&self) -> Option<RawTypeConverter> {
        None
    }
}
