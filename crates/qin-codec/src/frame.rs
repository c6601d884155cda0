//! 帧驱动: 逐帧拉取码流并走完整条解码管线.
//!
//! 一帧 = 帧头 + 可选 CRC + 侧边信息 + 主数据 (经比特储备库).
//! 每帧解码 G 个 granule × C 个声道 (MPEG-1: G=2, LSF: G=1),
//! 输出 16 位小端、双声道交织的 PCM; 单声道输入复制为双声道.
//!
//! 跨帧持久状态 (比特储备库、IMDCT 重叠缓冲区、合成 v 向量)
//! 全部归本结构所有, 构造时零初始化, 每帧复用.

use qin_core::{BitReader, QinError, QinResult};

use crate::FullRead;
use crate::alias;
use crate::header::{self, FrameHeader};
use crate::imdct;
use crate::maindata::{self, MainData};
use crate::reorder;
use crate::requantize;
use crate::side_info::SideInfo;
use crate::stereo;
use crate::synthesis::{self, SynthState};

/// 一帧的解码结果
#[derive(Debug)]
pub struct DecodedFrame {
    pub header: FrameHeader,
    /// 16 位小端双声道交织 PCM, 长度 = samples_per_frame × 4
    pub pcm: Vec<u8>,
    /// 帧头在流中的字节偏移
    pub position: u64,
    /// 下一帧帧头的字节偏移
    pub next_position: u64,
}

/// 帧解码器, 持有全部跨帧 DSP 状态
pub struct FrameDecoder {
    /// 比特储备库
    reservoir: BitReader,
    /// IMDCT 重叠缓冲区 `[声道][子带][样本]`
    store: [[[f32; 18]; 32]; 2],
    /// 合成滤波器状态, 每声道一个
    synth: [SynthState; 2],
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            reservoir: BitReader::new(Vec::new()),
            store: [[[0.0; 18]; 32]; 2],
            synth: [SynthState::default(), SynthState::default()],
        }
    }

    /// 从 `position` 起读取并解码下一帧.
    ///
    /// 帧头前的垃圾字节由同步搜索跳过 (有界);
    /// CRC 字节被跳过而不校验.
    pub fn next_frame(
        &mut self,
        source: &mut dyn FullRead,
        position: u64,
    ) -> QinResult<DecodedFrame> {
        let (header, after_header) = header::read_header(source, position)?;

        if header.has_crc() {
            let mut crc = [0u8; 2];
            source.read_full(&mut crc).map_err(|e| match e {
                QinError::Eof => QinError::UnexpectedEof("读取 CRC"),
                other => other,
            })?;
        }

        let mut side_info = SideInfo::read(source, &header)?;
        let (mut md, reservoir) =
            maindata::read(source, &self.reservoir, &header, &mut side_info)?;
        self.reservoir = reservoir;

        let pcm = self.decode(&header, &side_info, &mut md);
        let start = after_header - 4;
        Ok(DecodedFrame {
            header,
            pcm,
            position: start,
            next_position: start + header.frame_size() as u64,
        })
    }

    /// 解码管线: 反量化 → 重排序 → 立体声 → 抗混叠 →
    /// 混合滤波器组 (重叠相加) → 频率反转 → 子带合成 → 打包
    fn decode(&mut self, header: &FrameHeader, side_info: &SideInfo, md: &mut MainData) -> Vec<u8> {
        let nch = header.channels();
        let mut pcm = vec![0u8; header.bytes_per_frame()];
        let mut out = [[0.0f32; 576]; 2];

        for gr in 0..header.granules() {
            for ch in 0..nch {
                let g = side_info.granules[gr][ch];
                requantize::requantize(header, &g, md, gr, ch);
                reorder::reorder(header, &g, &mut md.is[gr][ch]);
            }

            stereo::stereo(header, side_info, md, gr);

            for ch in 0..nch {
                let g = side_info.granules[gr][ch];
                alias::antialias(&g, &mut md.is[gr][ch]);
                imdct::hybrid_synthesis(&g, &mut md.is[gr][ch], &mut self.store[ch]);
                synthesis::frequency_inversion(&mut md.is[gr][ch]);
                synthesis::subband_synthesis(&mut self.synth[ch], &md.is[gr][ch], &mut out[ch]);
            }

            for i in 0..576 {
                let idx = (gr * 576 + i) * 4;
                let left = clip(out[0][i]);
                let right = if nch == 2 { clip(out[1][i]) } else { left };
                pcm[idx..idx + 2].copy_from_slice(&left.to_le_bytes());
                pcm[idx + 2..idx + 4].copy_from_slice(&right.to_le_bytes());
            }
        }
        pcm
    }
}

/// 饱和截断到 int16
fn clip(sample: f32) -> i16 {
    if sample >= 32767.0 {
        32767
    } else if sample <= -32768.0 {
        -32768
    } else {
        sample as i16
    }
}
