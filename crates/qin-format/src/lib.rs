//! # qin-format
//!
//! 码流外围: 字节数据源、头部标签跳过、Xing/LAME 头解析、
//! 流式解码门面与 WAV 写出.
//!
//! 典型用法:
//!
//! ```rust,no_run
//! use qin_format::{Decoder, Source};
//!
//! let source = Source::open("input.mp3").unwrap();
//! let mut decoder = Decoder::new(source).unwrap();
//! let pcm = decoder.read_all().unwrap();
//! println!("{}Hz, {} 字节 PCM", decoder.sample_rate(), pcm.len());
//! ```

pub mod decoder;
pub mod lameinfo;
pub mod source;
pub mod tags;
pub mod wav;

// 重导出常用类型
pub use decoder::Decoder;
pub use lameinfo::LameInfo;
pub use source::{ByteSource, FileSource, MemorySource, ReaderSource, Source};
pub use wav::WavWriter;
