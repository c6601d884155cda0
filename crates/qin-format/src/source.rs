//! 字节数据源抽象.
//!
//! 解码器经由 [`ByteSource`] 读取码流, 支持文件、内存缓冲区与
//! 任意 `io::Read`. 可选的 seek 能力把解码器升级为可定位模式
//! (总长度、帧起始表、按时间定位); 数据源本身只被借用读取,
//! 所有权不转移给解码核心.

use std::io::{self, Read, Seek};

use qin_core::{QinError, QinResult};

/// 字节数据源后端
///
/// 实现此 trait 以支持不同来源 (文件、内存、网络流等).
pub trait ByteSource: Send {
    /// 读取数据, 返回实际读取的字节数 (0 表示流结束)
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位; 不可定位的源返回错误
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 是否支持随机访问
    fn is_seekable(&self) -> bool;
    /// 总大小 (如果可知)
    fn size(&self) -> Option<u64>;
}

/// 数据源包装: 跟踪绝对位置, 提供整块读取与回退缓冲
pub struct Source {
    inner: Box<dyn ByteSource>,
    /// 回退缓冲 (最近 unread 的字节, 后进先出)
    pushback: Vec<u8>,
    /// 当前绝对字节位置
    pos: u64,
}

impl Source {
    /// 从后端创建
    pub fn new(backend: Box<dyn ByteSource>) -> Self {
        Self {
            inner: backend,
            pushback: Vec::new(),
            pos: 0,
        }
    }

    /// 打开文件 (只读, 可定位)
    pub fn open(path: &str) -> QinResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileSource::new(file))))
    }

    /// 从内存数据创建 (可定位)
    pub fn from_data(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemorySource::from_data(data)))
    }

    /// 从任意 `io::Read` 创建 (不可定位)
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(Box::new(ReaderSource { reader }))
    }

    /// 当前绝对位置
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }

    /// 定位到绝对字节偏移 (清空回退缓冲)
    pub fn seek_to(&mut self, pos: u64) -> QinResult<()> {
        self.pushback.clear();
        self.inner.seek(io::SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// 回到流起点
    pub fn rewind(&mut self) -> QinResult<()> {
        self.seek_to(0)
    }

    /// 把读出的字节退回数据源, 下次读取优先返回
    pub fn unread(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            self.pushback.push(b);
        }
        self.pos -= bytes.len() as u64;
    }

    /// 跳过 n 个字节. 可定位的源直接前移, 否则读取并丢弃.
    pub fn skip(&mut self, mut n: u64) -> QinResult<()> {
        if self.pushback.is_empty() && self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(n as i64))?;
            self.pos += n;
            return Ok(());
        }
        let mut scratch = [0u8; 4096];
        while n > 0 {
            let step = (scratch.len() as u64).min(n) as usize;
            self.read_full(&mut scratch[..step])?;
            n -= step as u64;
        }
        Ok(())
    }

    /// 完整读满缓冲区.
    ///
    /// 起始处即无数据返回 [`QinError::Eof`], 中途断流返回
    /// [`QinError::UnexpectedEof`].
    pub fn read_full(&mut self, buf: &mut [u8]) -> QinResult<usize> {
        let mut total = 0usize;
        while total < buf.len() {
            if let Some(b) = self.pushback.pop() {
                buf[total] = b;
                total += 1;
                continue;
            }
            let n = self.inner.read(&mut buf[total..])?;
            if n == 0 {
                self.pos += total as u64;
                return if total == 0 {
                    Err(QinError::Eof)
                } else {
                    Err(QinError::UnexpectedEof("read_full"))
                };
            }
            total += n;
        }
        self.pos += total as u64;
        Ok(total)
    }
}

impl qin_codec::FullRead for Source {
    fn read_full(&mut self, buf: &mut [u8]) -> QinResult<usize> {
        Source::read_full(self, buf)
    }
}

/// 文件数据源
pub struct FileSource {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileSource {
    pub fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}

/// 内存缓冲区数据源, 用于测试与内存中处理
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek 位置不能为负"));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// 任意 `io::Read` 的包装, 不可定位
pub struct ReaderSource<R: Read + Send> {
    reader: R,
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "数据源不支持定位"))
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn size(&self) -> Option<u64> {
        None
    }
}
