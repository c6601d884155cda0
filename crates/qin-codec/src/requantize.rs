//! 反量化 (Requantization).
//!
//! 把 Huffman 解码出的整数频谱换算为浮点频谱:
//! `xr = sign(is) · |is|^(4/3) · 2^((global_gain−210)/4)
//!      · 2^(−sf_mult·(scalefac + preflag·pretab))`
//! 短窗样本的指数另加 `−8·subblock_gain[win]` (折算进 1/4 幂).

use crate::header::FrameHeader;
use crate::maindata::MainData;
use crate::side_info::Granule;
use crate::tables::{PRETAB, SF_BAND_INDICES};

/// 对一个 granule/声道反量化, 就地改写 `md.is[gr][ch]`
pub fn requantize(header: &FrameHeader, g: &Granule, md: &mut MainData, gr: usize, ch: usize) {
    let lsf = usize::from(header.low_sampling_frequency());
    let bands = &SF_BAND_INDICES[lsf][header.sampling_frequency()];

    if g.window_switching_flag && g.block_type == 2 {
        if g.mixed_block_flag {
            // 混合块: 前 36 个样本按长块处理
            let mut sfb = 0;
            let mut next_sfb = bands.l[1];
            for i in 0..36 {
                if i == next_sfb {
                    sfb += 1;
                    next_sfb = bands.l[sfb + 1];
                }
                requantize_long(g, md, gr, ch, i, sfb);
            }
            // 其余样本按短块处理, 从 sfb 3 起
            let mut sfb = 3;
            let mut next_sfb = bands.s[sfb + 1] * 3;
            let mut win_len = bands.s[sfb + 1] - bands.s[sfb];
            let mut i = 36;
            while i < 576 {
                if i == next_sfb {
                    sfb += 1;
                    next_sfb = bands.s[sfb + 1] * 3;
                    win_len = bands.s[sfb + 1] - bands.s[sfb];
                }
                for win in 0..3 {
                    for _ in 0..win_len {
                        requantize_short(g, md, gr, ch, i, sfb, win);
                        i += 1;
                    }
                }
            }
        } else {
            let mut sfb = 0;
            let mut next_sfb = bands.s[1] * 3;
            let mut win_len = bands.s[1] - bands.s[0];
            let mut i = 0;
            while i < 576 {
                if i == next_sfb {
                    sfb += 1;
                    next_sfb = bands.s[sfb + 1] * 3;
                    win_len = bands.s[sfb + 1] - bands.s[sfb];
                }
                for win in 0..3 {
                    for _ in 0..win_len {
                        requantize_short(g, md, gr, ch, i, sfb, win);
                        i += 1;
                    }
                }
            }
        }
    } else {
        let mut sfb = 0;
        let mut next_sfb = bands.l[1];
        for i in 0..576 {
            if i == next_sfb {
                sfb += 1;
                next_sfb = bands.l[sfb + 1];
            }
            requantize_long(g, md, gr, ch, i, sfb);
        }
    }
}

fn requantize_long(g: &Granule, md: &mut MainData, gr: usize, ch: usize, i: usize, sfb: usize) {
    let v = f64::from(md.is[gr][ch][i]);
    if v == 0.0 {
        return;
    }
    let sf_mult = if g.scalefac_scale { 1.0 } else { 0.5 };
    let pf = if g.preflag { f64::from(PRETAB[sfb]) } else { 0.0 };
    let sf = f64::from(md.scalefac_l[gr][ch][sfb]);

    let tmp1 = 2f64.powf(-sf_mult * (sf + pf));
    let tmp2 = 2f64.powf(0.25 * (f64::from(g.global_gain) - 210.0));
    let tmp3 = v.abs().powf(4.0 / 3.0) * v.signum();
    md.is[gr][ch][i] = (tmp1 * tmp2 * tmp3) as f32;
}

fn requantize_short(
    g: &Granule,
    md: &mut MainData,
    gr: usize,
    ch: usize,
    i: usize,
    sfb: usize,
    win: usize,
) {
    let v = f64::from(md.is[gr][ch][i]);
    if v == 0.0 {
        return;
    }
    let sf_mult = if g.scalefac_scale { 1.0 } else { 0.5 };
    let sf = f64::from(md.scalefac_s[gr][ch][sfb][win]);

    let tmp1 = 2f64.powf(-sf_mult * sf);
    let tmp2 = 2f64.powf(
        0.25 * (f64::from(g.global_gain) - 210.0 - 8.0 * f64::from(g.subblock_gain[win])),
    );
    let tmp3 = v.abs().powf(4.0 / 3.0) * v.signum();
    md.is[gr][ch][i] = (tmp1 * tmp2 * tmp3) as f32;
}
