//! Xing/Info (VBR) 与 LAME 扩展头解析.
//!
//! LAME 系编码器在第一个音频帧里写入 Xing/Info 标签, 记录总帧数、
//! 字节数、seek 目录与 gapless 播放所需的编码器延迟/填充.
//! 标签位于帧头与侧边信息之后 (偏移 `4 + side_info_size`).

use qin_codec::FrameHeader;

/// MP3 解码器固有延迟 (样本), 叠加在编码器延迟之上
pub const DECODER_DELAY: u32 = 529;

/// 标志位: 各可选字段是否存在
pub const FLAG_FRAME_COUNT: u32 = 0x0001;
pub const FLAG_BYTE_COUNT: u32 = 0x0002;
pub const FLAG_TOC: u32 = 0x0004;
pub const FLAG_VBR_SCALE: u32 = 0x0008;

/// 解析出的 Xing/LAME 头信息
#[derive(Debug, Clone)]
pub struct LameInfo {
    /// 标签名为 "Xing" (VBR) 时为 true, "Info" (CBR) 为 false
    pub is_xing: bool,
    /// 可选字段存在标志
    pub flags: u32,
    /// 总帧数
    pub frame_count: u32,
    /// 音频流总字节数
    pub byte_count: u32,
    /// VBR seek 目录: 100 个百分比位置
    pub toc: [u8; 100],
    /// VBR 质量指标 (0-100)
    pub vbr_scale: u32,
    /// 编码器版本串 (如 "LAME3.100"); 无 LAME 扩展时为 None
    pub lame_version: Option<String>,
    /// 编码器在起始处添加的静音样本数
    pub encoder_delay: u16,
    /// 编码器在末尾添加的填充样本数
    pub encoder_padding: u16,
}

impl LameInfo {
    pub fn has_frame_count(&self) -> bool {
        self.flags & FLAG_FRAME_COUNT != 0
    }

    pub fn has_byte_count(&self) -> bool {
        self.flags & FLAG_BYTE_COUNT != 0
    }

    pub fn has_toc(&self) -> bool {
        self.flags & FLAG_TOC != 0
    }

    pub fn has_vbr_scale(&self) -> bool {
        self.flags & FLAG_VBR_SCALE != 0
    }

    pub fn has_lame_info(&self) -> bool {
        self.lame_version.is_some()
    }

    /// gapless 播放在起始处应跳过的样本总数
    /// (编码器延迟 + 解码器固有延迟)
    pub fn total_delay(&self) -> u32 {
        match self.lame_version {
            Some(_) => u32::from(self.encoder_delay) + DECODER_DELAY,
            None => DECODER_DELAY,
        }
    }

    /// gapless 播放在末尾应裁掉的样本数 (已抵扣解码器延迟)
    pub fn total_padding(&self) -> u32 {
        if self.lame_version.is_none() {
            return 0;
        }
        u32::from(self.encoder_padding).saturating_sub(DECODER_DELAY)
    }
}

/// 从完整的第一帧 (含 4 字节帧头) 解析 Xing/LAME 头.
///
/// 帧内不含 "Xing"/"Info" 标签时返回 None.
pub fn parse(frame: &[u8]) -> Option<LameInfo> {
    if frame.len() < 4 {
        return None;
    }
    let header = FrameHeader::parse(u32::from_be_bytes([
        frame[0], frame[1], frame[2], frame[3],
    ]))
    .ok()?;

    let offset = 4 + header.side_info_size();
    if frame.len() < offset + 8 {
        return None;
    }

    let tag = &frame[offset..offset + 4];
    if tag != b"Xing" && tag != b"Info" {
        return None;
    }

    let mut info = LameInfo {
        is_xing: tag == b"Xing",
        flags: 0,
        frame_count: 0,
        byte_count: 0,
        toc: [0; 100],
        vbr_scale: 0,
        lame_version: None,
        encoder_delay: 0,
        encoder_padding: 0,
    };

    let mut pos = offset + 4;
    info.flags = read_u32(frame, &mut pos)?;

    if info.has_frame_count() {
        info.frame_count = read_u32(frame, &mut pos)?;
    }
    if info.has_byte_count() {
        info.byte_count = read_u32(frame, &mut pos)?;
    }
    if info.has_toc() {
        if frame.len() < pos + 100 {
            return None;
        }
        info.toc.copy_from_slice(&frame[pos..pos + 100]);
        pos += 100;
    }
    if info.has_vbr_scale() {
        info.vbr_scale = read_u32(frame, &mut pos)?;
    }

    // LAME 扩展: 9 字节版本串, 12 字节编码参数,
    // 随后 3 字节打包 12+12 位的 delay/padding
    if frame.len() >= pos + 9 {
        let version = &frame[pos..pos + 9];
        if is_lame_version(version) {
            info.lame_version = Some(String::from_utf8_lossy(version).into_owned());
            pos += 9;

            let delay_offset = pos + 12;
            if frame.len() >= delay_offset + 3 {
                let d = &frame[delay_offset..delay_offset + 3];
                info.encoder_delay = (u16::from(d[0]) << 4) | (u16::from(d[1]) >> 4);
                info.encoder_padding = (u16::from(d[1] & 0x0F) << 8) | u16::from(d[2]);
            }
        }
    }

    Some(info)
}

fn read_u32(frame: &[u8], pos: &mut usize) -> Option<u32> {
    if frame.len() < *pos + 4 {
        return None;
    }
    let v = u32::from_be_bytes([frame[*pos], frame[*pos + 1], frame[*pos + 2], frame[*pos + 3]]);
    *pos += 4;
    Some(v)
}

/// 版本串是否来自已知编码器
fn is_lame_version(s: &[u8]) -> bool {
    if s.len() < 4 {
        return false;
    }
    matches!(&s[..4], b"LAME" | b"L3.9" | b"Gogo" | b"GOGO")
}
