//! MP3 帧头解析与同步搜索.
//!
//! 帧头结构 (32 位):
//! ```text
//! AAAA AAAA  AAAB BCCD  EEEE FFGH  IIJJ KLMM
//! A = 同步位 (11 bit, 全1)   B = MPEG 版本    C = 层
//! D = CRC 保护              E = 比特率索引    F = 采样率索引
//! G = 填充位                H = 私有位        I = 声道模式
//! J = 模式扩展              K = 版权         L = 原始/复制
//! M = 强调
//! ```

use qin_core::{QinError, QinResult};

use crate::FullRead;

/// 同步搜索上限 (字节). 超出后报告 [`QinError::SyncSearchLimit`],
/// 上层在扫描阶段将其视为流结束.
pub const SYNC_SEARCH_LIMIT: usize = 65536;

/// 侧边信息允许的最大帧长 (字节), 超出视为损坏
pub const MAX_FRAME_SIZE: usize = 2000;

/// MPEG 版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

/// 声道模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    SingleChannel,
}

/// MPEG-1 Layer III 比特率表 (kbps)
const BITRATE_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// MPEG-2/2.5 Layer III 比特率表 (kbps)
const BITRATE_V2_L3: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// MPEG-1 采样率表, MPEG-2 取半, MPEG-2.5 取四分之一
const SAMPLERATE_V1: [u32; 3] = [44100, 48000, 32000];

/// MP3 帧头
///
/// 32 位原始值加解码访问器. 构造时 (`parse`/`read_header`) 已验证
/// 同步位、版本、层 (仅 Layer III)、比特率与采样率索引.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader(u32);

impl FrameHeader {
    /// 解析 4 字节帧头, 拒绝一切本解码器不处理的取值
    pub fn parse(value: u32) -> QinResult<Self> {
        // 同步位: 高 11 位全 1
        if (value & 0xFFE0_0000) != 0xFFE0_0000 {
            return Err(QinError::InvalidHeader("同步位缺失".into()));
        }
        // 版本位 01 为保留值
        if (value >> 19) & 0x3 == 1 {
            return Err(QinError::InvalidHeader("保留的 MPEG 版本".into()));
        }
        // 仅支持 Layer III (层位 01); 该拒绝是强制的,
        // 防止流内 Layer I/II 头造成伪同步
        if (value >> 17) & 0x3 != 1 {
            return Err(QinError::InvalidHeader("非 Layer III".into()));
        }
        // 比特率索引 0 (自由格式) 与 15 (非法) 均拒绝
        let bitrate_index = (value >> 12) & 0xF;
        if bitrate_index == 0 || bitrate_index == 15 {
            return Err(QinError::InvalidHeader("无效比特率索引".into()));
        }
        // 采样率索引 3 为保留值
        if (value >> 10) & 0x3 == 3 {
            return Err(QinError::InvalidHeader("无效采样率索引".into()));
        }
        Ok(Self(value))
    }

    /// 原始 32 位值
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// MPEG 版本
    pub fn version(&self) -> MpegVersion {
        match (self.0 >> 19) & 0x3 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            _ => MpegVersion::Mpeg1,
        }
    }

    /// 是否为低采样率 (LSF) 版本 (MPEG-2 / MPEG-2.5)
    pub fn low_sampling_frequency(&self) -> bool {
        self.version() != MpegVersion::Mpeg1
    }

    /// 是否携带 CRC 校验字 (保护位为 0 表示有 CRC)
    pub fn has_crc(&self) -> bool {
        (self.0 >> 16) & 0x1 == 0
    }

    /// 比特率 (bps)
    pub fn bitrate(&self) -> u32 {
        let idx = ((self.0 >> 12) & 0xF) as usize;
        let kbps = if self.version() == MpegVersion::Mpeg1 {
            BITRATE_V1_L3[idx]
        } else {
            BITRATE_V2_L3[idx]
        };
        kbps * 1000
    }

    /// 采样率索引 (0-2)
    pub fn sampling_frequency(&self) -> usize {
        ((self.0 >> 10) & 0x3) as usize
    }

    /// 采样率 (Hz)
    pub fn sample_rate(&self) -> u32 {
        let base = SAMPLERATE_V1[self.sampling_frequency()];
        match self.version() {
            MpegVersion::Mpeg1 => base,
            MpegVersion::Mpeg2 => base / 2,
            MpegVersion::Mpeg25 => base / 4,
        }
    }

    /// 填充位
    pub fn padding(&self) -> bool {
        (self.0 >> 9) & 0x1 == 1
    }

    /// 声道模式
    pub fn mode(&self) -> ChannelMode {
        match (self.0 >> 6) & 0x3 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::SingleChannel,
        }
    }

    /// 模式扩展 (联合立体声时: bit1 = MS, bit0 = IS)
    pub fn mode_extension(&self) -> u8 {
        ((self.0 >> 4) & 0x3) as u8
    }

    /// 强调
    pub fn emphasis(&self) -> u8 {
        (self.0 & 0x3) as u8
    }

    /// 每帧 granule 数 (MPEG-1 为 2, LSF 为 1)
    pub fn granules(&self) -> usize {
        if self.low_sampling_frequency() { 1 } else { 2 }
    }

    /// 声道数
    pub fn channels(&self) -> usize {
        if self.mode() == ChannelMode::SingleChannel {
            1
        } else {
            2
        }
    }

    /// 每帧每声道采样数 (576 × granules)
    pub fn samples_per_frame(&self) -> usize {
        576 * self.granules()
    }

    /// 侧边信息大小 (字节): MPEG-1 单声道 17 / 立体声 32,
    /// LSF 单声道 9 / 立体声 17
    pub fn side_info_size(&self) -> usize {
        match (self.low_sampling_frequency(), self.channels()) {
            (false, 1) => 17,
            (false, _) => 32,
            (true, 1) => 9,
            (true, _) => 17,
        }
    }

    /// 帧总字节数 (含 4 字节帧头):
    /// `(samples_per_frame / 8) * bitrate / sample_rate + padding`
    pub fn frame_size(&self) -> usize {
        let factor = (self.samples_per_frame() / 8) as u32;
        let size = factor * self.bitrate() / self.sample_rate();
        size as usize + usize::from(self.padding())
    }

    /// 每帧解码输出的 PCM 字节数 (固定双声道 16 位)
    pub fn bytes_per_frame(&self) -> usize {
        self.samples_per_frame() * 4
    }
}

/// 从 `position` 起向前同步搜索, 读取下一个有效帧头.
///
/// 每次取 4 字节检验, 无效则前移 1 字节重试; 在
/// [`SYNC_SEARCH_LIMIT`] 字节内仍无有效帧头时报告
/// [`QinError::SyncSearchLimit`]. 返回帧头与帧头后的新位置.
pub fn read_header(source: &mut dyn FullRead, position: u64) -> QinResult<(FrameHeader, u64)> {
    let mut pos = position;
    let mut buf = [0u8; 4];
    source.read_full(&mut buf)?;

    let mut searched = 0usize;
    loop {
        let value = u32::from_be_bytes(buf);
        match FrameHeader::parse(value) {
            Ok(header) => return Ok((header, pos + 4)),
            Err(QinError::InvalidHeader(_)) => {}
            Err(e) => return Err(e),
        }

        searched += 1;
        if searched > SYNC_SEARCH_LIMIT {
            return Err(QinError::SyncSearchLimit);
        }

        // 前移一个字节继续搜索
        buf.copy_within(1.., 0);
        let mut next = [0u8; 1];
        source.read_full(&mut next)?;
        buf[3] = next[0];
        pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_帧头_mpeg1_joint_stereo() {
        // MPEG1 Layer3 128kbps 44100Hz 联合立体声, 无填充
        let h = FrameHeader::parse(0xFFFB_9044).unwrap();
        assert_eq!(h.version(), MpegVersion::Mpeg1);
        assert_eq!(h.bitrate(), 128_000);
        assert_eq!(h.sample_rate(), 44100);
        assert_eq!(h.mode(), ChannelMode::JointStereo);
        assert_eq!(h.granules(), 2);
        assert_eq!(h.samples_per_frame(), 1152);
        assert_eq!(h.side_info_size(), 32);
        // 144 * 128000 / 44100 = 417
        assert_eq!(h.frame_size(), 417);
        assert!(!h.has_crc());
    }

    #[test]
    fn test_帧头_mpeg2_mono() {
        // MPEG2 Layer3 80kbps 22050Hz 单声道
        let h = FrameHeader::parse(0xFFF3_90C0).unwrap();
        assert_eq!(h.version(), MpegVersion::Mpeg2);
        assert_eq!(h.sample_rate(), 22050);
        assert_eq!(h.mode(), ChannelMode::SingleChannel);
        assert_eq!(h.channels(), 1);
        assert_eq!(h.granules(), 1);
        assert_eq!(h.samples_per_frame(), 576);
        assert_eq!(h.side_info_size(), 9);
        // 72 * 80000 / 22050 = 261
        assert_eq!(h.frame_size(), 261);

        // 任意 MPEG2 帧每帧采样数均为 576
        let h2 = FrameHeader::parse(0xFFF3_9000).unwrap();
        assert_eq!(h2.samples_per_frame(), 576);
        assert_eq!(h2.granules(), 1);
    }

    #[test]
    fn test_帧头_拒绝非法值() {
        // 同步位缺失
        assert!(FrameHeader::parse(0x0000_0000).is_err());
        assert!(FrameHeader::parse(0x1234_5678).is_err());
        // Layer II 伪同步 (层位 10) 必须拒绝
        assert!(FrameHeader::parse(0xFFFC_9044).is_err());
        // Layer I (层位 11)
        assert!(FrameHeader::parse(0xFFFE_9044).is_err());
        // 比特率索引 0 (自由格式) 与 15
        assert!(FrameHeader::parse(0xFFFB_0044).is_err());
        assert!(FrameHeader::parse(0xFFFB_F044).is_err());
        // 采样率索引 3
        assert!(FrameHeader::parse(0xFFFB_9C44).is_err());
        // 保留版本 (版本位 01)
        assert!(FrameHeader::parse(0xFFEB_9044).is_err());
    }

    /// 简易内存数据源
    struct SliceSource {
        data: Vec<u8>,
        pos: usize,
    }

    impl FullRead for SliceSource {
        fn read_full(&mut self, buf: &mut [u8]) -> QinResult<usize> {
            if self.pos >= self.data.len() {
                return Err(QinError::Eof);
            }
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            if n < buf.len() {
                return Err(QinError::UnexpectedEof("read_full"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_同步搜索_跳过垃圾字节() {
        let mut data = vec![0x00, 0x12, 0xFF, 0x00];
        data.extend_from_slice(&0xFFFB_9044u32.to_be_bytes());
        let mut src = SliceSource { data, pos: 0 };

        let (h, new_pos) = read_header(&mut src, 0).unwrap();
        assert_eq!(h.raw(), 0xFFFB_9044);
        assert_eq!(new_pos, 8);
    }

    #[test]
    fn test_同步搜索_layer2_伪同步不被消费() {
        // Layer II 头后跟真正的 Layer III 头: 搜索应跳过前者
        let mut data = 0xFFFC_4200u32.to_be_bytes().to_vec();
        data.extend_from_slice(&0xFFFB_9044u32.to_be_bytes());
        let mut src = SliceSource { data, pos: 0 };

        let (h, _) = read_header(&mut src, 0).unwrap();
        assert_eq!(h.raw(), 0xFFFB_9044);
    }

    #[test]
    fn test_同步搜索_超限() {
        let data = vec![0u8; SYNC_SEARCH_LIMIT + 64];
        let mut src = SliceSource { data, pos: 0 };
        match read_header(&mut src, 0) {
            Err(QinError::SyncSearchLimit) => {}
            other => panic!("预期 SyncSearchLimit, 实际 {other:?}"),
        }
    }
}
