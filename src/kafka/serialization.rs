use wp_connector_api::SinkResult;
use wp_model_core::model::DataRecord;

use super::converter::KafkaColumnConverter;

/// 待发送的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRecord {
    pub topic: String,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

pub struct RowSerializationSchema {
    topic: String,
    converter: KafkaColumnConverter,
}

impl RowSerializationSchema {
    pub fn new(topic: &str, converter: KafkaColumnConverter) -> Self {
        Self {
            topic: topic.to_string(),
            converter,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn serialize(&self, record: &DataRecord) -> SinkResult<ProducerRecord> {
        Ok(ProducerRecord {
            topic: self.topic.clone(),
            key: self.converter.message_key(record),
            payload: self.converter.convert(record)?,
        })
    }
}
