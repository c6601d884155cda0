//! # qin-core
//!
//! Qin MP3 解码器核心库, 提供错误类型与位流读取基础设施.
//!
//! 本 crate 为整个 Qin 工作空间提供底层基础, 不包含任何解码逻辑.

pub mod bitreader;
pub mod error;

// 重导出常用类型
pub use bitreader::BitReader;
pub use error::{QinError, QinResult};
