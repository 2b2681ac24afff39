use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orion_error::ErrorOweBase;
use rdkafka_wrap::{KWProducer, KWProducerConf};
use wp_connector_api::{
    AsyncCtrl, AsyncRawDataSink, AsyncRecordSink, SinkReason, SinkResult,
};
use wp_log::info_data;
use wp_model_core::model::DataRecord;

use super::config::BOOTSTRAP_SERVERS;
use super::serialization::RowSerializationSchema;

/// 默认的 producer 池大小
pub const DEFAULT_KAFKA_PRODUCERS_POOL_SIZE: usize = 5;

const TOPIC_PARTITIONS: i32 = 1;
const TOPIC_REPLICATION: i32 = 1;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub type Properties = BTreeMap<String, String>;

/// 投递语义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    None,
    AtLeastOnce,
    ExactlyOnce,
}

/// 绑定单个 topic 的 producer；客户端在首条消息时按池大小创建，轮询发送
pub struct KafkaProducer {
    topic: String,
    schema: RowSerializationSchema,
    properties: Properties,
    semantic: Semantic,
    pool_size: usize,
    pool: Vec<Arc<KWProducer>>,
    next: usize,
}

impl KafkaProducer {
    pub fn new(
        topic: &str,
        schema: RowSerializationSchema,
        properties: Properties,
        semantic: Semantic,
        pool_size: usize,
    ) -> SinkResult<Self> {
        if topic.trim().is_empty() {
            return Err(SinkReason::sink("kafka.topic must not be empty").into());
        }
        if properties
            .get(BOOTSTRAP_SERVERS)
            .is_none_or(|b| b.trim().is_empty())
        {
            return Err(SinkReason::sink("kafka producer requires bootstrap.servers").into());
        }
        if semantic == Semantic::ExactlyOnce {
            return Err(SinkReason::sink("kafka exactly-once delivery is not supported").into());
        }
        if pool_size == 0 {
            return Err(SinkReason::sink("kafka producer pool size must be > 0").into());
        }
        Ok(Self {
            topic: topic.to_string(),
            schema,
            properties,
            semantic,
            pool_size,
            pool: Vec::new(),
            next: 0,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn semantic(&self) -> Semantic {
        self.semantic
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn schema(&self) -> &RowSerializationSchema {
        &self.schema
    }

    fn producer_conf(&self) -> KWProducerConf {
        let brokers = self
            .properties
            .get(BOOTSTRAP_SERVERS)
            .map(String::as_str)
            .unwrap_or_default();
        let extra: HashMap<&str, &str> = self
            .properties
            .iter()
            .filter(|(k, _)| k.as_str() != BOOTSTRAP_SERVERS)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        KWProducerConf::new(brokers)
            .set_topic_conf(&self.topic, TOPIC_PARTITIONS, TOPIC_REPLICATION)
            .set_config(extra)
    }

    fn ensure_pool(&mut self) -> SinkResult<()> {
        if !self.pool.is_empty() {
            return Ok(());
        }
        for _ in 0..self.pool_size {
            let producer = KWProducer::new(self.producer_conf())
                .owe(SinkReason::Sink("kafka connect fail".into()))?;
            self.pool.push(Arc::new(producer));
        }
        info_data!(
            "[kafka] topic: {}, producers: {}, semantic: {:?}",
            self.topic,
            self.pool_size,
            self.semantic
        );
        Ok(())
    }

    fn next_producer(&mut self) -> SinkResult<Arc<KWProducer>> {
        self.ensure_pool()?;
        let producer = self.pool[self.next % self.pool.len()].clone();
        self.next = self.next.wrapping_add(1);
        Ok(producer)
    }

    async fn send(&mut self, payload: &[u8], key: &[u8]) -> SinkResult<()> {
        let producer = self.next_producer()?;
        producer
            .publish(payload, key)
            .await
            .owe(SinkReason::Sink("kafka send fail".into()))?;
        Ok(())
    }

    fn flush_all(&self) -> SinkResult<()> {
        for producer in &self.pool {
            producer
                .flush(rdkafka_wrap::util::Timeout::After(FLUSH_TIMEOUT))
                .owe(SinkReason::Sink("kafka flush fail".into()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncCtrl for KafkaProducer {
    async fn stop(&mut self) -> SinkResult<()> {
        if self.semantic == Semantic::AtLeastOnce {
            self.flush_all()?;
        }
        self.pool.clear();
        Ok(())
    }
    async fn reconnect(&mut self) -> SinkResult<()> {
        self.pool.clear();
        self.ensure_pool()
    }
}

#[async_trait]
impl AsyncRecordSink for KafkaProducer {
    async fn sink_record(&mut self, data: &DataRecord) -> SinkResult<()> {
        let msg = self.schema.serialize(data)?;
        self.send(&msg.payload, &msg.key).await
    }
    async fn sink_records(&mut self, data: Vec<Arc<DataRecord>>) -> SinkResult<()> {
        for item in data {
            self.sink_record(item.as_ref()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncRawDataSink for KafkaProducer {
    async fn sink_str(&mut self, data: &str) -> SinkResult<()> {
        self.send(data.as_bytes(), &[]).await
    }
    async fn sink_bytes(&mut self, data: &[u8]) -> SinkResult<()> {
        self.send(data, &[]).await
    }

    async fn sink_str_batch(&mut self, data: Vec<&str>) -> SinkResult<()> {
        for item in data {
            self.sink_str(item).await?;
        }
        Ok(())
    }

    async fn sink_bytes_batch(&mut self, data: Vec<&[u8]>) -> SinkResult<()> {
        for item in data {
            self.sink_bytes(item).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kafka::config::KafkaConf;
    use crate::kafka::converter::KafkaColumnConverter;

    fn schema(conf: &KafkaConf) -> RowSerializationSchema {
        RowSerializationSchema::new(&conf.topic, KafkaColumnConverter::new(conf))
    }

    fn props(conf: &KafkaConf) -> Properties {
        conf.producer_settings.clone()
    }

    #[test]
    fn new_keeps_settings_without_connecting() {
        let conf = KafkaConf::new("orders", "k1:9092");
        let producer = KafkaProducer::new(
            "orders",
            schema(&conf),
            props(&conf),
            Semantic::AtLeastOnce,
            DEFAULT_KAFKA_PRODUCERS_POOL_SIZE,
        )
        .expect("producer");
        assert_eq!(producer.topic(), "orders");
        assert_eq!(producer.semantic(), Semantic::AtLeastOnce);
        assert_eq!(producer.pool_size(), 5);
        assert!(producer.pool.is_empty());
        assert_eq!(producer.schema().topic(), "orders");
    }

    #[test]
    fn new_rejects_invalid_settings() {
        let conf = KafkaConf::new("orders", "k1:9092");
        let cases = vec![
            ("", props(&conf), Semantic::AtLeastOnce, 5, "kafka.topic"),
            ("orders", Properties::new(), Semantic::AtLeastOnce, 5, "bootstrap.servers"),
            ("orders", props(&conf), Semantic::ExactlyOnce, 5, "exactly-once"),
            ("orders", props(&conf), Semantic::None, 0, "pool size"),
        ];
        for (topic, properties, semantic, pool, expected) in cases {
            let err = match KafkaProducer::new(topic, schema(&conf), properties, semantic, pool) {
                Ok(_) => panic!("[{expected}] must fail"),
                Err(e) => e,
            };
            assert!(format!("{err}").contains(expected), "[{expected}]");
        }
    }

    #[tokio::test]
    async fn stop_before_first_send_is_noop() {
        let conf = KafkaConf::new("orders", "k1:9092");
        let mut producer = KafkaProducer::new(
            "orders",
            schema(&conf),
            props(&conf),
            Semantic::AtLeastOnce,
            1,
        )
        .expect("producer");
        producer.stop().await.expect("stop");
        assert!(producer.pool.is_empty());
    }
}
