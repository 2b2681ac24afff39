//! Greenplum sink：通用 JDBC 输出 + Greenplum 方言
//!
//! - converter：列类型名映射与 bytea 字面量
//! - dialect：连接串、标识符引用、upsert
//! - output_format：GreenplumOutputFormat（open 时安装列转换器）
//! - factory：GreenplumSinkFactory

mod converter;
mod dialect;
mod factory;
mod output_format;

pub use converter::{bytea_literal, greenplum_raw_type};
pub use dialect::GreenplumDialect;
pub use factory::GreenplumSinkFactory;
pub use output_format::GreenplumOutputFormat;
