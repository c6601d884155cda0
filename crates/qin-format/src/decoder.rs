//! 流式解码门面.
//!
//! 把帧解码核心包装成可读的 PCM 字节流: 固定 16 位小端、双声道
//! 交织, 采样率取自第一帧. 构造时跳过头部标签并解码第一帧锁定
//! 采样率; 数据源可定位时整体扫描一遍建立帧起始表与总长度,
//! 随后支持字节/样本/时间三种粒度的定位.
//!
//! 生命周期状态: Fresh → Primed (首帧锁定) → Streaming (读取中)
//! → Exhausted (流尽, 对 read 粘滞; 显式 seek 可回到 Primed).

use std::io;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use log::debug;
use qin_codec::{FrameDecoder, read_header};
use qin_core::{QinError, QinResult};

use crate::source::Source;
use crate::tags;

/// 解码器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Primed,
    Streaming,
    Exhausted,
}

/// 流式 MP3 解码器
///
/// 输出始终为 16 位小端双声道 (单声道输入复制), 一对采样 4 字节.
/// 同一实例不可在多线程间无同步共用.
pub struct Decoder {
    source: Source,
    frames: FrameDecoder,
    sample_rate: u32,
    /// 总 PCM 字节数; 数据源不可定位时为 None
    length: Option<u64>,
    /// 每个成功解析的帧头的字节偏移 (仅可定位数据源)
    frame_starts: Vec<u64>,
    /// 已解码未读出的 PCM
    buf: BytesMut,
    /// 输出流当前字节位置
    pos: u64,
    /// 每帧解码出的 PCM 字节数
    bytes_per_frame: u64,
    state: State,
}

impl Decoder {
    /// 创建解码器: 跳过头部标签, 解码第一帧锁定采样率,
    /// 可定位数据源再扫描全流建立帧起始表与总长度.
    pub fn new(source: Source) -> QinResult<Self> {
        let mut d = Self {
            source,
            frames: FrameDecoder::new(),
            sample_rate: 0,
            length: None,
            frame_starts: Vec::new(),
            buf: BytesMut::new(),
            pos: 0,
            bytes_per_frame: 0,
            state: State::Fresh,
        };

        tags::skip_leading_tags(&mut d.source)?;
        d.read_frame()?;
        d.state = State::Primed;
        d.ensure_frame_starts_and_length()?;
        Ok(d)
    }

    /// 解码下一帧并把 PCM 追加到缓冲.
    /// 同步超限与流中途结束折算为 [`QinError::Eof`].
    fn read_frame(&mut self) -> QinResult<()> {
        let pos = self.source.pos();
        match self.frames.next_frame(&mut self.source, pos) {
            Ok(frame) => {
                if self.state == State::Fresh {
                    self.sample_rate = frame.header.sample_rate();
                    self.bytes_per_frame = frame.header.bytes_per_frame() as u64;
                }
                self.buf.extend_from_slice(&frame.pcm);
                Ok(())
            }
            Err(e) if e.is_end_of_stream() => Err(QinError::Eof),
            Err(e) => Err(e),
        }
    }

    /// 可定位数据源: 扫描全流, 记录每个帧头偏移并累计 PCM 总长,
    /// 完成后回到扫描前的位置.
    fn ensure_frame_starts_and_length(&mut self) -> QinResult<()> {
        if self.length.is_some() || !self.source.is_seekable() {
            return Ok(());
        }

        let saved = self.source.pos();
        self.source.rewind()?;
        tags::skip_leading_tags(&mut self.source)?;

        let mut total = 0u64;
        loop {
            let pos = self.source.pos();
            let header = match read_header(&mut self.source, pos) {
                Ok((h, _)) => h,
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => return Err(e),
            };
            self.frame_starts.push(self.source.pos() - 4);
            self.bytes_per_frame = header.bytes_per_frame() as u64;
            total += self.bytes_per_frame;

            let mut rest = vec![0u8; header.frame_size() - 4];
            if let Err(e) = self.source.read_full(&mut rest) {
                if e.is_end_of_stream() {
                    break;
                }
                return Err(e);
            }
        }
        self.length = Some(total);
        debug!(
            "扫描完成: {} 帧, PCM 总长 {total} 字节",
            self.frame_starts.len()
        );

        self.source.seek_to(saved)?;
        Ok(())
    }

    /// 读取解码后的 PCM 字节. 流结束返回 `Ok(0)` (区别于错误);
    /// 帧级错误 (InvalidHuffmanCode / OutOfRange) 上抛,
    /// 不毒化解码器, 再次调用继续解下一帧.
    pub fn read(&mut self, buf: &mut [u8]) -> QinResult<usize> {
        if self.state == State::Exhausted {
            return Ok(0);
        }
        while self.buf.is_empty() {
            match self.read_frame() {
                Ok(()) => {}
                Err(QinError::Eof) => {
                    self.state = State::Exhausted;
                    return Ok(0);
                }
                Err(e) => return Err(e),
            }
        }
        self.state = State::Streaming;

        let n = buf.len().min(self.buf.len());
        buf[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        self.pos += n as u64;
        Ok(n)
    }

    /// 读出剩余全部 PCM
    pub fn read_all(&mut self) -> QinResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// 按输出字节偏移定位.
    ///
    /// 策略: 由 `bytes_per_frame` 折算目标帧号 f, 从帧 f−1 起
    /// 解码一帧预滚 (重建重叠缓冲与 v 向量), 再解码目标帧并
    /// 丢弃帧内偏移之前的字节. DSP 状态先整体复位.
    pub fn seek(&mut self, pos: io::SeekFrom) -> QinResult<u64> {
        if let io::SeekFrom::Current(0) = pos {
            return Ok(self.pos);
        }
        let length = self
            .length
            .ok_or_else(|| QinError::Unsupported("数据源不可定位".into()))?;

        let npos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
            io::SeekFrom::End(offset) => length as i64 + offset,
        };
        self.pos = npos.max(0) as u64;
        self.buf.clear();
        self.frames = FrameDecoder::new();
        self.state = State::Primed;

        if self.pos >= length {
            self.state = State::Exhausted;
            return Ok(self.pos);
        }

        let f = self.pos / self.bytes_per_frame;
        if f > 0 {
            self.source.seek_to(self.frame_starts[(f - 1) as usize])?;
            self.read_frame()?;
            self.read_frame()?;
            let skip = self.bytes_per_frame + self.pos % self.bytes_per_frame;
            self.buf.advance((skip as usize).min(self.buf.len()));
        } else {
            self.source.seek_to(self.frame_starts[0])?;
            self.read_frame()?;
            self.buf.advance((self.pos as usize).min(self.buf.len()));
        }
        Ok(self.pos)
    }

    /// 采样率 (取自第一帧)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// PCM 总字节数; 数据源不可定位时为 None
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// 每帧解码出的 PCM 字节数
    pub fn bytes_per_frame(&self) -> u64 {
        self.bytes_per_frame
    }

    /// 帧起始表 (仅可定位数据源非空)
    pub fn frame_starts(&self) -> &[u64] {
        &self.frame_starts
    }

    /// 总时长; 不可定位时为 None
    pub fn duration(&self) -> Option<Duration> {
        self.length.map(|l| self.bytes_to_duration(l))
    }

    /// 当前播放位置
    pub fn position(&self) -> Duration {
        self.bytes_to_duration(self.pos)
    }

    /// 剩余时长
    pub fn remaining(&self) -> Option<Duration> {
        self.duration().map(|d| d.saturating_sub(self.position()))
    }

    /// 播放进度 (0.0 - 1.0)
    pub fn progress(&self) -> Option<f64> {
        let length = self.length?;
        if length == 0 {
            return Some(0.0);
        }
        Some(self.pos as f64 / length as f64)
    }

    /// 当前采样位置 (每声道; 一对采样 4 字节)
    pub fn sample_position(&self) -> u64 {
        self.pos / 4
    }

    /// 总采样数 (每声道); 不可定位时为 None
    pub fn sample_count(&self) -> Option<u64> {
        self.length.map(|l| l / 4)
    }

    /// 按采样位置定位, 越界时截断到有效范围
    pub fn seek_to_sample(&mut self, sample: u64) -> QinResult<()> {
        let max = self
            .sample_count()
            .ok_or_else(|| QinError::Unsupported("数据源不可定位".into()))?;
        let sample = sample.min(max);
        self.seek(io::SeekFrom::Start(sample * 4))?;
        Ok(())
    }

    /// 按绝对时间定位, 越界时截断; 偏移对齐到 4 字节采样边界
    pub fn seek_to_time(&mut self, t: Duration) -> QinResult<()> {
        let dur = self
            .duration()
            .ok_or_else(|| QinError::Unsupported("数据源不可定位".into()))?;
        let t = t.min(dur);
        let bytes = self.duration_to_bytes(t) & !3;
        self.seek(io::SeekFrom::Start(bytes))?;
        Ok(())
    }

    /// 相对当前位置前后跳转 (delta 为秒, 可为负)
    pub fn skip_duration(&mut self, delta: f64) -> QinResult<()> {
        let target = self.position().as_secs_f64() + delta;
        self.seek_to_time(Duration::from_secs_f64(target.max(0.0)))
    }

    fn bytes_to_duration(&self, bytes: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(bytes as f64 / (f64::from(self.sample_rate) * 4.0))
    }

    fn duration_to_bytes(&self, dur: Duration) -> u64 {
        (dur.as_secs_f64() * f64::from(self.sample_rate) * 4.0) as u64
    }
}

impl io::Read for Decoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Decoder::read(self, buf).map_err(io::Error::other)
    }
}

impl io::Seek for Decoder {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        Decoder::seek(self, pos).map_err(io::Error::other)
    }
}
