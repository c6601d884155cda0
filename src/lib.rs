//! # Qin (琴)
//!
//! 纯 Rust 实现的流式 MP3 (MPEG-1/2 Layer III) 解码器.
//!
//! 输入任意字节源 (文件、内存、`io::Read`), 输出 16 位小端
//! 双声道交织 PCM; 可定位数据源额外提供总长度、帧起始表与
//! 字节/采样/时间三种粒度的定位.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use qin::format::{Decoder, Source};
//!
//! let source = Source::open("input.mp3").unwrap();
//! let mut decoder = Decoder::new(source).unwrap();
//! let pcm = decoder.read_all().unwrap();
//! println!("{}Hz, {} 字节 PCM", decoder.sample_rate(), pcm.len());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `qin-core` | 错误类型与 MSB-first 位流读取 |
//! | `qin-codec` | Layer III 解码核心 (帧同步到子带合成) |
//! | `qin-format` | 数据源、标签跳过、Xing/LAME 解析、流式门面 |

/// 错误类型与位流工具
pub use qin_core as core;

/// Layer III 解码核心
pub use qin_codec as codec;

/// 数据源与流式解码门面
pub use qin_format as format;

/// 获取 Qin 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
