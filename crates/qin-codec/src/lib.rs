//! # qin-codec
//!
//! MPEG-1/2 Layer III 码流到 PCM 的解码核心.
//!
//! 管线: 帧同步 → 帧头/侧边信息解析 → 比特储备库重组 →
//! 比例因子 + Huffman 频谱 → 反量化/重排序/立体声 →
//! 抗混叠 + IMDCT + 重叠相加 → 多相子带合成 → int16 打包.
//!
//! 本 crate 不做 I/O: 字节经由 [`FullRead`] 注入, 由上层
//! (qin-format) 提供数据源实现.

pub mod alias;
pub mod frame;
pub mod header;
pub mod huffman;
pub mod huffman_tables;
pub mod imdct;
pub mod maindata;
pub mod reorder;
pub mod requantize;
pub mod side_info;
pub mod stereo;
pub mod synthesis;
pub mod tables;

use qin_core::QinResult;

// 重导出常用类型
pub use frame::{DecodedFrame, FrameDecoder};
pub use header::{ChannelMode, FrameHeader, MpegVersion, read_header};
pub use side_info::SideInfo;

/// 解码核心消费字节的最小接口.
///
/// 约定: 完整读满缓冲区返回 `Ok(len)`; 起始处即无数据返回
/// [`qin_core::QinError::Eof`]; 中途断流返回
/// [`qin_core::QinError::UnexpectedEof`].
pub trait FullRead {
    fn read_full(&mut self, buf: &mut [u8]) -> QinResult<usize>;
}
