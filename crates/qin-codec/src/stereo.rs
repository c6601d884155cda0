//! 立体声处理: MS Stereo 与 Intensity Stereo.
//!
//! 仅联合立体声模式生效, 由模式扩展位控制:
//! bit1 = MS (中/侧信号还原), bit0 = IS (强度立体声).
//! IS 作用于右声道 rzero 区之上的频带, 以右声道比例因子为
//! 位置参数; MPEG-1 与 LSF 使用不同的角度表, LSF 还带有
//! illegal position 检测.

use crate::header::{ChannelMode, FrameHeader, MpegVersion};
use crate::maindata::MainData;
use crate::side_info::SideInfo;
use crate::tables::SF_BAND_INDICES;

/// MPEG-1 强度立体声 illegal position
const MPEG1_ILLEGAL_POS: i32 = 7;

/// 对一个 granule 做立体声处理, 就地改写两个声道的频谱
pub fn stereo(header: &FrameHeader, side_info: &SideInfo, md: &mut MainData, gr: usize) {
    if header.mode() != ChannelMode::JointStereo {
        return;
    }

    // MS: 整个联合区间做中/侧还原
    if header.mode_extension() & 0x2 != 0 {
        let max_pos = side_info.granules[gr][0]
            .count1
            .max(side_info.granules[gr][1].count1);
        let (left, right) = split_channels(md, gr);
        let inv_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;
        for i in 0..max_pos {
            let mid = left[i];
            let side = right[i];
            left[i] = (mid + side) * inv_sqrt2;
            right[i] = (mid - side) * inv_sqrt2;
        }
    }

    // IS: 右声道全零区之上的频带
    if header.mode_extension() & 0x1 != 0 {
        let g = side_info.granules[gr][0];
        let right_count1 = side_info.granules[gr][1].count1;
        let lsf = usize::from(header.low_sampling_frequency());
        let bands = &SF_BAND_INDICES[lsf][header.sampling_frequency()];

        if g.window_switching_flag && g.block_type == 2 {
            if g.mixed_block_flag {
                for sfb in 0..8 {
                    if bands.l[sfb] >= right_count1 {
                        intensity_long(header, md, gr, sfb, bands.l[sfb], bands.l[sfb + 1]);
                    }
                }
                for sfb in 3..12 {
                    if bands.s[sfb] * 3 >= right_count1 {
                        intensity_short(header, md, gr, sfb, bands.s[sfb], bands.s[sfb + 1]);
                    }
                }
            } else {
                for sfb in 0..12 {
                    if bands.s[sfb] * 3 >= right_count1 {
                        intensity_short(header, md, gr, sfb, bands.s[sfb], bands.s[sfb + 1]);
                    }
                }
            }
        } else {
            for sfb in 0..21 {
                if bands.l[sfb] >= right_count1 {
                    intensity_long(header, md, gr, sfb, bands.l[sfb], bands.l[sfb + 1]);
                }
            }
        }
    }
}

fn split_channels(md: &mut MainData, gr: usize) -> (&mut [f32; 576], &mut [f32; 576]) {
    let (l, r) = md.is[gr].split_at_mut(1);
    (&mut l[0], &mut r[0])
}

/// 长块频带 [start, stop) 的强度立体声
fn intensity_long(
    header: &FrameHeader,
    md: &mut MainData,
    gr: usize,
    sfb: usize,
    start: usize,
    stop: usize,
) {
    let factors = if header.version() == MpegVersion::Mpeg1 {
        mpeg1_is_factors(md.scalefac_l[gr][1][sfb])
    } else {
        lsf_is_factors(md.ist_pos_l[gr][sfb], md.lsf_intensity_scale[gr])
    };
    let Some((kl, kr)) = factors else {
        return;
    };

    let (left, right) = split_channels(md, gr);
    for i in start..stop {
        let m = left[i];
        left[i] = m * kl;
        right[i] = m * kr;
    }
}

/// 短块频带的强度立体声, 逐窗口处理.
/// 重排后窗口样本以步长 3 交织, 窗口 w 的样本位于
/// `3·s[sfb] + w, 3·s[sfb] + w + 3, …`.
fn intensity_short(
    header: &FrameHeader,
    md: &mut MainData,
    gr: usize,
    sfb: usize,
    band_start: usize,
    band_stop: usize,
) {
    let start = band_start * 3;
    let stop = band_stop * 3;
    for win in 0..3 {
        let factors = if header.version() == MpegVersion::Mpeg1 {
            mpeg1_is_factors(md.scalefac_s[gr][1][sfb][win])
        } else {
            lsf_is_factors(md.ist_pos_s[gr][sfb][win], md.lsf_intensity_scale[gr])
        };
        let Some((kl, kr)) = factors else {
            continue;
        };

        let (left, right) = split_channels(md, gr);
        let mut i = start + win;
        while i < stop {
            let m = left[i];
            left[i] = m * kl;
            right[i] = m * kr;
            i += 3;
        }
    }
}

/// MPEG-1 角度系数: is_ratio = tan(is_pos·π/12),
/// (kl, kr) = (r/(1+r), 1/(1+r)); is_pos = 7 为 illegal, 不处理
fn mpeg1_is_factors(is_pos: i32) -> Option<(f32, f32)> {
    if is_pos == MPEG1_ILLEGAL_POS {
        return None;
    }
    let ratio = (f64::from(is_pos) * std::f64::consts::PI / 12.0).tan();
    Some((
        (ratio / (1.0 + ratio)) as f32,
        (1.0 / (1.0 + ratio)) as f32,
    ))
}

/// LSF 系数: io = 2^(-1/4) (intensity_scale=1) 或 2^(-1/2),
/// is_pos 奇数衰减左声道, 偶数衰减右声道; -1 为 illegal, 不处理
fn lsf_is_factors(is_pos: i32, intensity_scale: u32) -> Option<(f32, f32)> {
    if is_pos < 0 {
        return None;
    }
    if is_pos == 0 {
        return Some((1.0, 1.0));
    }
    let io: f64 = if intensity_scale == 1 {
        std::f64::consts::FRAC_1_SQRT_2.sqrt() // 2^(-1/4)
    } else {
        std::f64::consts::FRAC_1_SQRT_2 // 2^(-1/2)
    };
    if is_pos % 2 == 1 {
        Some((io.powi((is_pos + 1) / 2) as f32, 1.0))
    } else {
        Some((1.0, io.powi(is_pos / 2) as f32))
    }
}
