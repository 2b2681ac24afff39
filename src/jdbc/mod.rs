//! 通用 JDBC 风格输出：配置、方言、列转换器与批量写出
//!
//! 具体数据库（如 greenplum）只提供方言与原始类型映射。

pub mod config;
pub mod converter;
pub mod dialect;
pub mod output_format;

pub use config::{JdbcConf, WriteMode};
pub use converter::{JdbcColumnConverter, RowConverter};
pub use dialect::JdbcDialect;
pub use output_format::{JdbcOutputFormat, check_task};
