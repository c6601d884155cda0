//! 主数据 (Main Data) 读取: 比特储备库、比例因子与 Huffman 频谱.
//!
//! 主数据可以经由比特储备库回溯引用此前若干帧的载荷:
//! 新帧的解码从已累积字节的尾部向前 `main_data_begin` 字节处开始.
//! 储备库字节数不足时该帧输出静音, 储备库仍照常推进.

use log::debug;
use qin_core::{BitReader, QinError, QinResult};

use crate::FullRead;
use crate::header::{ChannelMode, FrameHeader};
use crate::huffman;
use crate::side_info::SideInfo;
use crate::tables::{LSF_NR_OF_SFB, SAMPLES_PER_GRANULE, SCALEFAC_SIZES, SF_BAND_INDICES};

/// 解码一帧后储备库保留的最大字节数.
/// `main_data_begin` 至多 511, 960 字节留有余量.
pub const RESERVOIR_MAX: usize = 960;

/// 主数据: 比例因子与频谱工作区
pub struct MainData {
    /// 长块比例因子 `[gr][ch][sfb]`
    pub scalefac_l: [[[i32; 22]; 2]; 2],
    /// 短块比例因子 `[gr][ch][sfb][win]`
    pub scalefac_s: [[[[i32; 3]; 13]; 2]; 2],
    /// 频谱样本 `[gr][ch]`: Huffman 整数输出, 反量化后为浮点
    pub is: [[[f32; 576]; 2]; 2],
    /// LSF 强度立体声位置 (右声道, `[gr]`), -1 表示 illegal position
    pub ist_pos_l: [[i32; 22]; 2],
    pub ist_pos_s: [[[i32; 3]; 13]; 2],
    /// LSF 强度立体声缩放选择 (scalefac_compress 最低位, `[gr]`)
    pub lsf_intensity_scale: [u32; 2],
}

impl Default for MainData {
    fn default() -> Self {
        Self::new()
    }
}

impl MainData {
    /// 创建全零工作区
    pub fn new() -> Self {
        Self {
            scalefac_l: [[[0; 22]; 2]; 2],
            scalefac_s: [[[[0; 3]; 13]; 2]; 2],
            is: [[[0.0; 576]; 2]; 2],
            ist_pos_l: [[0; 22]; 2],
            ist_pos_s: [[[0; 3]; 13]; 2],
            lsf_intensity_scale: [0; 2],
        }
    }
}

/// 读取一帧主数据, 返回 (主数据, 推进后的储备库).
///
/// 帧内主数据字节数 = 帧长 − 帧头 − CRC − 侧边信息.
/// 先把新字节并入储备库, 再从尾部向前 `main_data_begin` 字节处
/// 开始逐 granule/声道读取比例因子与 Huffman 频谱.
pub fn read(
    source: &mut dyn FullRead,
    reservoir: &BitReader,
    header: &FrameHeader,
    side_info: &mut SideInfo,
) -> QinResult<(MainData, BitReader)> {
    let crc_size = if header.has_crc() { 2 } else { 0 };
    let main_data_size = header.frame_size() - header.side_info_size() - 4 - crc_size;

    let mut buf = vec![0u8; main_data_size];
    source.read_full(&mut buf).map_err(|e| match e {
        QinError::Eof => QinError::UnexpectedEof("读取主数据"),
        other => other,
    })?;

    // 储备库照常推进: 完整历史 + 新载荷, 裁剪到上限
    let mut advanced = reservoir.clone();
    advanced.append(&buf);
    let advanced = trim_reservoir(advanced);

    let begin = side_info.main_data_begin;
    if begin > reservoir.len_in_bytes() {
        // 储备库不足: 本帧静音
        debug!(
            "比特储备库不足: 需要 {begin} 字节, 现有 {} 字节, 本帧静音",
            reservoir.len_in_bytes()
        );
        return Ok((MainData::new(), advanced));
    }

    let mut vec = reservoir.tail(begin).to_vec();
    vec.extend_from_slice(&buf);
    let mut m = BitReader::new(vec);

    let mut md = MainData::new();
    for gr in 0..header.granules() {
        for ch in 0..header.channels() {
            let part2_start = m.bit_pos();
            if header.low_sampling_frequency() {
                read_lsf_scalefactors(&mut m, header, side_info, &mut md, gr, ch);
            } else {
                read_mpeg1_scalefactors(&mut m, side_info, &mut md, gr, ch);
            }
            if m.overrun() {
                return Err(QinError::UnexpectedEof("比例因子位流"));
            }
            read_huffman(&mut m, header, side_info, &mut md, part2_start, gr, ch)?;
        }
    }

    Ok((md, advanced))
}

fn trim_reservoir(m: BitReader) -> BitReader {
    if m.len_in_bytes() > RESERVOIR_MAX {
        BitReader::new(m.tail(RESERVOIR_MAX).to_vec())
    } else {
        m
    }
}

/// MPEG-1 比例因子读取.
///
/// 长块按 4 个频带组读取, gr=1 时 scfsi 置位的组复用 gr=0 的值.
fn read_mpeg1_scalefactors(
    m: &mut BitReader,
    side_info: &mut SideInfo,
    md: &mut MainData,
    gr: usize,
    ch: usize,
) {
    let g = side_info.granules[gr][ch];
    let (slen1, slen2) = SCALEFAC_SIZES[g.scalefac_compress as usize];

    if g.window_switching_flag && g.block_type == 2 {
        if g.mixed_block_flag {
            // 混合块: 长块 sfb 0-7 + 短块 sfb 3-11
            for sfb in 0..8 {
                md.scalefac_l[gr][ch][sfb] = m.bits(slen1) as i32;
            }
            for sfb in 3..12 {
                let n = if sfb < 6 { slen1 } else { slen2 };
                for win in 0..3 {
                    md.scalefac_s[gr][ch][sfb][win] = m.bits(n) as i32;
                }
            }
        } else {
            for sfb in 0..12 {
                let n = if sfb < 6 { slen1 } else { slen2 };
                for win in 0..3 {
                    md.scalefac_s[gr][ch][sfb][win] = m.bits(n) as i32;
                }
            }
        }
    } else {
        // 长块: 频带组 0-5 / 6-10 / 11-15 / 16-20
        const GROUPS: [(usize, usize); 4] = [(0, 6), (6, 11), (11, 16), (16, 21)];
        for (band, &(start, end)) in GROUPS.iter().enumerate() {
            let n = if band < 2 { slen1 } else { slen2 };
            if side_info.scfsi[ch][band] == 1 && gr == 1 {
                for sfb in start..end {
                    md.scalefac_l[1][ch][sfb] = md.scalefac_l[0][ch][sfb];
                }
            } else {
                for sfb in start..end {
                    md.scalefac_l[gr][ch][sfb] = m.bits(n) as i32;
                }
            }
        }
    }
}

/// LSF (MPEG-2/2.5) 比例因子读取 (ISO/IEC 13818-3).
///
/// scalefac_compress 按分段算法展开成 4 组位宽 slen 与每组频带数;
/// 强度立体声右声道使用独立的分段与分组表, 并把
/// `(1 << slen) - 1` 识别为 illegal position.
fn read_lsf_scalefactors(
    m: &mut BitReader,
    header: &FrameHeader,
    side_info: &mut SideInfo,
    md: &mut MainData,
    gr: usize,
    ch: usize,
) {
    let g = &mut side_info.granules[gr][ch];
    let mut sfc = g.scalefac_compress as i32;
    let intensity_right = header.mode() == ChannelMode::JointStereo
        && header.mode_extension() & 0x1 != 0
        && ch == 1;

    let block_class = if g.window_switching_flag && g.block_type == 2 {
        if g.mixed_block_flag { 2 } else { 1 }
    } else {
        0
    };

    let mut slen = [0usize; 4];
    let row;
    g.preflag = false;

    if intensity_right {
        md.lsf_intensity_scale[gr] = (sfc & 1) as u32;
        sfc >>= 1;
        if sfc < 180 {
            slen = [
                (sfc / 36) as usize,
                ((sfc % 36) / 6) as usize,
                ((sfc % 36) % 6) as usize,
                0,
            ];
            row = 3;
        } else if sfc < 244 {
            let t = sfc - 180;
            slen = [((t % 64) >> 4) as usize, ((t % 16) >> 2) as usize, (t % 4) as usize, 0];
            row = 4;
        } else {
            let t = sfc - 244;
            slen = [(t / 3) as usize, (t % 3) as usize, 0, 0];
            row = 5;
        }
    } else if sfc < 400 {
        slen = [
            ((sfc >> 4) / 5) as usize,
            ((sfc >> 4) % 5) as usize,
            ((sfc % 16) >> 2) as usize,
            (sfc % 4) as usize,
        ];
        row = 0;
    } else if sfc < 500 {
        let t = sfc - 400;
        slen = [((t >> 2) / 5) as usize, ((t >> 2) % 5) as usize, (t % 4) as usize, 0];
        row = 1;
    } else {
        let t = sfc - 500;
        slen = [(t / 3) as usize, (t % 3) as usize, 0, 0];
        row = 2;
        g.preflag = true;
    }

    // 读入平面序列
    let counts = &LSF_NR_OF_SFB[row][block_class];
    let mut flat = [0i32; 36];
    let mut illegal = [false; 36];
    let mut n = 0usize;
    for (grp, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            if slen[grp] > 0 {
                let v = m.bits(slen[grp]) as i32;
                flat[n] = v;
                illegal[n] = intensity_right && v == (1 << slen[grp]) - 1;
            }
            n += 1;
        }
    }

    // 映射到长/短块数组
    let ist = |val: i32, ill: bool| if ill { -1 } else { val };
    match block_class {
        1 => {
            for i in 0..n {
                md.scalefac_s[gr][ch][i / 3][i % 3] = flat[i];
                if intensity_right {
                    md.ist_pos_s[gr][i / 3][i % 3] = ist(flat[i], illegal[i]);
                }
            }
        }
        2 => {
            for i in 0..6 {
                md.scalefac_l[gr][ch][i] = flat[i];
                if intensity_right {
                    md.ist_pos_l[gr][i] = ist(flat[i], illegal[i]);
                }
            }
            for i in 6..n {
                let sfb = 3 + (i - 6) / 3;
                md.scalefac_s[gr][ch][sfb][(i - 6) % 3] = flat[i];
                if intensity_right {
                    md.ist_pos_s[gr][sfb][(i - 6) % 3] = ist(flat[i], illegal[i]);
                }
            }
        }
        _ => {
            for i in 0..n.min(21) {
                md.scalefac_l[gr][ch][i] = flat[i];
                if intensity_right {
                    md.ist_pos_l[gr][i] = ist(flat[i], illegal[i]);
                }
            }
        }
    }
}

/// Huffman 频谱读取 (ISO/IEC 11172-3 §2.4.3.4.6).
///
/// big_values 区按 region 选表逐对解码; count1 区以四元组表解码,
/// 直到样本位置到达 572 或位游标越过本 granule/声道的位区间.
/// 游标越过 `end + 1` 时回退一个四元组, 随后 rzero 区补零,
/// 游标精确对齐到 `end + 1`.
fn read_huffman(
    m: &mut BitReader,
    header: &FrameHeader,
    side_info: &mut SideInfo,
    md: &mut MainData,
    part2_start: usize,
    gr: usize,
    ch: usize,
) -> QinResult<()> {
    let g = side_info.granules[gr][ch];
    let is = &mut md.is[gr][ch];

    if g.part2_3_length == 0 {
        is.fill(0.0);
        side_info.granules[gr][ch].count1 = 0;
        return Ok(());
    }

    let bit_pos_end = part2_start + g.part2_3_length - 1;

    let (region1_start, region2_start) = if g.window_switching_flag && g.block_type == 2 {
        // 短块: region1 固定从 36 起, 无 region2
        (36, SAMPLES_PER_GRANULE)
    } else {
        let lsf = usize::from(header.low_sampling_frequency());
        let l = &SF_BAND_INDICES[lsf][header.sampling_frequency()].l;
        // region 计数之和越过表尾时收敛到 576 (与 mpg123/ffmpeg 一致), 不报错
        let i = (g.region0_count + 1).min(l.len() - 1);
        let j = (g.region0_count + g.region1_count + 2).min(l.len() - 1);
        (l[i], l[j])
    };

    let mut is_pos = 0usize;
    while is_pos < g.big_values * 2 {
        if is_pos >= SAMPLES_PER_GRANULE {
            return Err(QinError::OutOfRange(format!("big_values 区越界: {is_pos}")));
        }
        let table = if is_pos < region1_start {
            g.table_select[0]
        } else if is_pos < region2_start {
            g.table_select[1]
        } else {
            g.table_select[2]
        };
        let (x, y) = huffman::decode_big_values(m, table)?;
        is[is_pos] = x;
        is[is_pos + 1] = y;
        is_pos += 2;
    }

    let table = if g.count1table_select { 33 } else { 32 };
    while is_pos <= 572 && m.bit_pos() <= bit_pos_end {
        let (v, w, x, y) = huffman::decode_count1(m, table)?;
        is[is_pos] = v;
        is[is_pos + 1] = w;
        is[is_pos + 2] = x;
        is[is_pos + 3] = y;
        is_pos += 4;
    }

    // 游标越过区间末尾时, 最后一组四元组基于越界比特, 不可信
    if m.bit_pos() > bit_pos_end + 1 {
        is_pos = is_pos.saturating_sub(4);
    }
    side_info.granules[gr][ch].count1 = is_pos;

    for s in is[is_pos..].iter_mut() {
        *s = 0.0;
    }
    m.set_bit_pos(bit_pos_end + 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side_info::Granule;

    struct SliceSource(Vec<u8>, usize);

    impl FullRead for SliceSource {
        fn read_full(&mut self, buf: &mut [u8]) -> QinResult<usize> {
            if self.1 + buf.len() > self.0.len() {
                return Err(QinError::Eof);
            }
            buf.copy_from_slice(&self.0[self.1..self.1 + buf.len()]);
            self.1 += buf.len();
            Ok(buf.len())
        }
    }

    fn empty_side_info() -> SideInfo {
        SideInfo {
            main_data_begin: 0,
            private_bits: 0,
            scfsi: [[0; 4]; 2],
            granules: [[Granule::default(); 2]; 2],
        }
    }

    #[test]
    fn test_region_计数钳位() {
        // region0_count=15, region1_count=7: 索引和超出长块频带表尾,
        // region2_start 收敛到 576, 解码不得报错
        let header = FrameHeader::parse(0xFFFB_9044).unwrap();
        let mut si = empty_side_info();
        for ch in 0..2 {
            for gr in 0..2 {
                let g = &mut si.granules[gr][ch];
                g.part2_3_length = 100;
                g.big_values = 10;
                g.region0_count = 15;
                g.region1_count = 7;
                // table_select 全 0: 表 0 不消费比特, 输出零
            }
        }
        let mut md = MainData::new();
        let mut m = BitReader::new(vec![0u8; 64]);
        read_huffman(&mut m, &header, &mut si, &mut md, 0, 0, 0).unwrap();
        // big_values 区 (表 0) 全零
        assert!(md.is[0][0][..20].iter().all(|&v| v == 0.0));
        // count1 区每组四元组 9 位 (码字 6 + 符号 3), 第 12 组越界回退
        assert_eq!(si.granules[0][0].count1, 64);
        assert!(md.is[0][0][64..].iter().all(|&v| v == 0.0));
        // 位游标精确对齐到区间之后
        assert_eq!(m.bit_pos(), 100);
    }

    #[test]
    fn test_储备库不足时输出静音() {
        let header = FrameHeader::parse(0xFFFB_9044).unwrap();
        let mut si = empty_side_info();
        si.main_data_begin = 100;

        let main_data_size = header.frame_size() - header.side_info_size() - 4;
        let mut src = SliceSource(vec![0xAA; main_data_size], 0);
        let reservoir = BitReader::new(Vec::new());

        let (md, new_reservoir) = read(&mut src, &reservoir, &header, &mut si).unwrap();
        assert!(md.is[0][0].iter().all(|&v| v == 0.0));
        // 新字节仍然入库
        assert_eq!(new_reservoir.len_in_bytes(), main_data_size);
    }

    #[test]
    fn test_储备库上限() {
        let header = FrameHeader::parse(0xFFFB_9044).unwrap();
        let mut si = empty_side_info();

        let main_data_size = header.frame_size() - header.side_info_size() - 4;
        let reservoir = BitReader::new(vec![0u8; 900]);
        let mut src = SliceSource(vec![0u8; main_data_size], 0);

        let (_, new_reservoir) = read(&mut src, &reservoir, &header, &mut si).unwrap();
        assert!(new_reservoir.len_in_bytes() <= RESERVOIR_MAX);
    }

    #[test]
    fn test_mpeg1_长块比例因子与scfsi复用() {
        let mut si = empty_side_info();
        // scalefac_compress = 1 → slen1 = 0, slen2 = 1
        si.granules[0][0].scalefac_compress = 1;
        si.granules[1][0].scalefac_compress = 1;
        si.scfsi[0] = [0, 0, 1, 1];

        let mut md = MainData::new();
        // gr=0: 组 2/3 (sfb 11-20) 各 1 位, 全部读 1
        let mut m = BitReader::new(vec![0xFF, 0xFF]);
        read_mpeg1_scalefactors(&mut m, &mut si, &mut md, 0, 0);
        assert_eq!(md.scalefac_l[0][0][11], 1);
        assert_eq!(md.scalefac_l[0][0][20], 1);
        assert_eq!(md.scalefac_l[0][0][5], 0);

        // gr=1: scfsi 组 2/3 置位 → 复用 gr=0 的值, 不再消费比特
        let before = m.bit_pos();
        read_mpeg1_scalefactors(&mut m, &mut si, &mut md, 1, 0);
        assert_eq!(m.bit_pos(), before);
        assert_eq!(md.scalefac_l[1][0][11], 1);
        assert_eq!(md.scalefac_l[1][0][20], 1);
    }

    #[test]
    fn test_lsf_比例因子分组() {
        // MPEG2 立体声, 非强度立体声: sfc = 100 → 行 0, 长块分组 {6,5,5,5}
        // slen = [(100>>4)/5, (100>>4)%5, (100%16)>>2, 100%4] = [1, 1, 1, 0]
        let header = FrameHeader::parse(0xFFF3_9040).unwrap();
        let mut si = empty_side_info();
        si.granules[0][0].scalefac_compress = 100;

        let mut md = MainData::new();
        let mut m = BitReader::new(vec![0xFF, 0xFF, 0xFF]);
        read_lsf_scalefactors(&mut m, &header, &mut si, &mut md, 0, 0);
        // 6 + 5 + 5 个 1 位值读出 1, 最后一组 slen=0 补零
        assert_eq!(m.bit_pos(), 16);
        assert_eq!(md.scalefac_l[0][0][0], 1);
        assert_eq!(md.scalefac_l[0][0][15], 1);
        assert_eq!(md.scalefac_l[0][0][16], 0);
        assert!(!si.granules[0][0].preflag);
    }
}
