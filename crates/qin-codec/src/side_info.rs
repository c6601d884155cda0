//! MP3 侧边信息 (Side Information) 解析.
//!
//! MPEG-1 为 17/32 字节, LSF 为 9/17 字节 (单声道/立体声).
//! 窗口切换时 region 计数不在码流中传输, 按参考解码器约定取隐式值.

use qin_core::{BitReader, QinError, QinResult};

use crate::header::{ChannelMode, FrameHeader, MAX_FRAME_SIZE};
use crate::FullRead;

/// 每 granule/声道的侧边信息
#[derive(Debug, Clone, Copy, Default)]
pub struct Granule {
    pub part2_3_length: usize,
    pub big_values: usize,
    pub global_gain: u32,
    pub scalefac_compress: u32,
    pub window_switching_flag: bool,

    pub block_type: u8,
    pub mixed_block_flag: bool,
    pub table_select: [usize; 3],
    pub subblock_gain: [u32; 3],

    pub region0_count: usize,
    pub region1_count: usize,

    pub preflag: bool,
    pub scalefac_scale: bool,
    pub count1table_select: bool,

    /// rzero 区首个样本下标, 由 Huffman 阶段计算, 不在码流中
    pub count1: usize,
}

/// 侧边信息
#[derive(Debug, Clone)]
pub struct SideInfo {
    pub main_data_begin: usize,
    pub private_bits: u32,
    /// 比例因子选择信息 `[声道][频带组]` (仅 MPEG-1)
    pub scfsi: [[u32; 4]; 2],
    /// `[granule][声道]` (MPEG-1: 2×2, LSF: 1×2)
    pub granules: [[Granule; 2]; 2],
}

/// (main_data_begin, private 单声道, private 立体声, scalefac_compress) 位数
const BITS_TO_READ: [[usize; 4]; 2] = [
    // MPEG-1
    [9, 5, 3, 4],
    // MPEG-2/2.5
    [8, 1, 2, 9],
];

impl SideInfo {
    /// 从数据源读取并解析侧边信息
    pub fn read(source: &mut dyn FullRead, header: &FrameHeader) -> QinResult<Self> {
        let frame_size = header.frame_size();
        if frame_size > MAX_FRAME_SIZE {
            return Err(QinError::OutOfRange(format!("帧长 {frame_size} 字节")));
        }

        let mut buf = vec![0u8; header.side_info_size()];
        source.read_full(&mut buf).map_err(|e| match e {
            QinError::Eof => QinError::UnexpectedEof("读取侧边信息"),
            other => other,
        })?;
        let mut s = BitReader::new(buf);

        let mpeg1 = !header.low_sampling_frequency();
        let bits_to_read = BITS_TO_READ[usize::from(!mpeg1)];
        let nch = header.channels();

        let mut si = SideInfo {
            main_data_begin: s.bits(bits_to_read[0]) as usize,
            private_bits: 0,
            scfsi: [[0; 4]; 2],
            granules: [[Granule::default(); 2]; 2],
        };

        si.private_bits = if header.mode() == ChannelMode::SingleChannel {
            s.bits(bits_to_read[1])
        } else {
            s.bits(bits_to_read[2])
        };

        if mpeg1 {
            for ch in 0..nch {
                for band in 0..4 {
                    si.scfsi[ch][band] = s.bits(1);
                }
            }
        }

        for gr in 0..header.granules() {
            for ch in 0..nch {
                let g = &mut si.granules[gr][ch];
                g.part2_3_length = s.bits(12) as usize;
                g.big_values = s.bits(9) as usize;
                g.global_gain = s.bits(8);
                g.scalefac_compress = s.bits(bits_to_read[3]);
                g.window_switching_flag = s.bits(1) == 1;

                if g.window_switching_flag {
                    g.block_type = s.bits(2) as u8;
                    g.mixed_block_flag = s.bits(1) == 1;
                    for region in 0..2 {
                        g.table_select[region] = s.bits(5) as usize;
                    }
                    for window in 0..3 {
                        g.subblock_gain[window] = s.bits(3);
                    }

                    // 窗口切换时 region 计数不传输, 取隐式值.
                    // 纯短块为 8, 其余为 7; region1 覆盖余下全部频带.
                    // 规范对此并无明文, 此处保持与参考解码器逐位一致.
                    g.region0_count = if g.block_type == 2 && !g.mixed_block_flag {
                        8
                    } else {
                        7
                    };
                    g.region1_count = 20 - g.region0_count;
                } else {
                    for region in 0..3 {
                        g.table_select[region] = s.bits(5) as usize;
                    }
                    g.region0_count = s.bits(4) as usize;
                    g.region1_count = s.bits(3) as usize;
                    g.block_type = 0;
                    if !mpeg1 {
                        // LSF 非切换分支清除首 granule 的 mixed_block_flag,
                        // 与参考实现保持一致
                        si.granules[0][ch].mixed_block_flag = false;
                    }
                }

                let g = &mut si.granules[gr][ch];
                if mpeg1 {
                    g.preflag = s.bits(1) == 1;
                }
                g.scalefac_scale = s.bits(1) == 1;
                g.count1table_select = s.bits(1) == 1;
            }
        }

        if s.overrun() {
            return Err(QinError::UnexpectedEof("侧边信息位流"));
        }
        Ok(si)
    }
}
