//! Kafka sink：配置解码、列转换、序列化与 producer 工厂
//!
//! 模块划分：
//! - config：KafkaConf 与 SettingsDecoder
//! - startup：StartupMode（自定义解码）
//! - converter / serialization：记录 -> 消息
//! - producer：KafkaProducer（AsyncRecordSink/AsyncRawDataSink）
//! - factory：KafkaSinkFactory

mod config;
mod converter;
mod factory;
mod producer;
mod serialization;
mod startup;

pub use config::{BOOTSTRAP_SERVERS, KafkaConf, SettingsDecoder};
pub use converter::KafkaColumnConverter;
pub use factory::KafkaSinkFactory;
pub use producer::{DEFAULT_KAFKA_PRODUCERS_POOL_SIZE, KafkaProducer, Properties, Semantic};
pub use serialization::{ProducerRecord, RowSerializationSchema};
pub use startup::{StartupMode, UnknownStartupMode};
