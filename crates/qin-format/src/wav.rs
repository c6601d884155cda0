//! WAV (RIFF WAVE) 写出.
//!
//! 把解码出的 PCM S16LE 写入标准 WAV 文件:
//! 1. `new()` 写入 RIFF 与 fmt 块, 预留大小字段
//! 2. `write_samples()` 追加 PCM 数据
//! 3. `finalize()` 回填 RIFF 大小与 data 块大小

use std::io::{self, Seek, Write};

use log::debug;
use qin_core::QinResult;

/// WAV 音频格式码: PCM 整数
const WAV_FORMAT_PCM: u16 = 0x0001;

/// WAV 写出器 (固定 16 位 PCM)
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    /// RIFF 大小字段的偏移 (回填用)
    riff_size_offset: u64,
    /// data 块大小字段的偏移 (回填用)
    data_size_offset: u64,
    /// 已写入的数据字节数
    data_written: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    /// 写入 WAV 头并创建写出器
    pub fn new(mut inner: W, sample_rate: u32, channels: u16) -> QinResult<Self> {
        let bits_per_sample: u16 = 16;
        let block_align = channels * (bits_per_sample / 8);
        let byte_rate = sample_rate * u32::from(block_align);

        inner.write_all(b"RIFF")?;
        let riff_size_offset = inner.stream_position()?;
        inner.write_all(&0u32.to_le_bytes())?;
        inner.write_all(b"WAVE")?;

        inner.write_all(b"fmt ")?;
        inner.write_all(&16u32.to_le_bytes())?;
        inner.write_all(&WAV_FORMAT_PCM.to_le_bytes())?;
        inner.write_all(&channels.to_le_bytes())?;
        inner.write_all(&sample_rate.to_le_bytes())?;
        inner.write_all(&byte_rate.to_le_bytes())?;
        inner.write_all(&block_align.to_le_bytes())?;
        inner.write_all(&bits_per_sample.to_le_bytes())?;

        inner.write_all(b"data")?;
        let data_size_offset = inner.stream_position()?;
        inner.write_all(&0u32.to_le_bytes())?;

        Ok(Self {
            inner,
            riff_size_offset,
            data_size_offset,
            data_written: 0,
        })
    }

    /// 追加 PCM 数据
    pub fn write_samples(&mut self, pcm: &[u8]) -> QinResult<()> {
        self.inner.write_all(pcm)?;
        self.data_written += pcm.len() as u64;
        Ok(())
    }

    /// 回填大小字段并返回底层写出对象
    pub fn finalize(mut self) -> QinResult<W> {
        let data_size = self.data_written as u32;
        let riff_size = data_size + 36;

        self.inner.seek(io::SeekFrom::Start(self.riff_size_offset))?;
        self.inner.write_all(&riff_size.to_le_bytes())?;
        self.inner.seek(io::SeekFrom::Start(self.data_size_offset))?;
        self.inner.write_all(&data_size.to_le_bytes())?;
        self.inner.seek(io::SeekFrom::End(0))?;
        self.inner.flush()?;

        debug!("WAV 写出完成: data 块 {data_size} 字节");
        Ok(self.inner)
    }
}
