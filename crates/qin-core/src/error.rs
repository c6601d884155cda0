//! 统一错误类型定义.
//!
//! 所有 Qin crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Qin 解码器统一错误类型
#[derive(Debug, Error)]
pub enum QinError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 疑似帧头的字节中存在非法字段, 同步搜索会在原地继续
    #[error("无效帧头: {0}")]
    InvalidHeader(String),

    /// 同步搜索超出上限 (有界前瞻内未找到有效帧头)
    #[error("同步搜索超出上限")]
    SyncSearchLimit,

    /// 数据流在结构中途结束
    #[error("数据流提前结束: {0}")]
    UnexpectedEof(&'static str),

    /// 所选 Huffman 码表中没有匹配的前缀
    #[error("无效 Huffman 码字: {0}")]
    InvalidHuffmanCode(String),

    /// 侧边信息声明的尺寸超出允许范围
    #[error("字段超出允许范围: {0}")]
    OutOfRange(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,
}

/// Qin 统一 Result 类型
pub type QinResult<T> = Result<T, QinError>;

impl QinError {
    /// 是否属于"干净的流结束"条件.
    ///
    /// 同步搜索超限与流中途结束在输出边界都折算为流结束,
    /// 只有剩余的错误种类会继续向调用方传播.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(
            self,
            QinError::Eof | QinError::SyncSearchLimit | QinError::UnexpectedEof(_)
        )
    }
}
