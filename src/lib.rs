//! Stream sink connectors: Greenplum (JDBC-style output) and Kafka (producer factory).

pub mod common;

// JDBC 通用输出：随 greenplum 特性启用
#[cfg(feature = "greenplum")]
pub mod jdbc;

// Greenplum：默认启用（feature = "greenplum"）
#[cfg(feature = "greenplum")]
pub mod greenplum;

// Kafka：默认启用（feature = "kafka"）
#[cfg(feature = "kafka")]
pub mod kafka;
