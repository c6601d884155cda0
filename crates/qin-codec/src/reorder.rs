//! 短块重排序 (Reordering).
//!
//! Huffman/反量化输出的短块样本按 "频带 → 窗口 → 频率" 排列;
//! IMDCT 需要的是每条频率线上 w0 w1 w2 交织的顺序.
//! 混合块的长块部分 (前 36 个样本, 即短块 sfb 0-2 的范围) 不参与重排.

use crate::header::FrameHeader;
use crate::side_info::Granule;
use crate::tables::SF_BAND_INDICES;

/// 对一个 granule/声道就地重排短块样本
pub fn reorder(header: &FrameHeader, g: &Granule, is: &mut [f32; 576]) {
    if !(g.window_switching_flag && g.block_type == 2) {
        return;
    }

    let lsf = usize::from(header.low_sampling_frequency());
    let s = &SF_BAND_INDICES[lsf][header.sampling_frequency()].s;

    let mut re = [0.0f32; 576];
    let mut sfb = if g.mixed_block_flag { 3 } else { 0 };
    let mut next_sfb = s[sfb + 1] * 3;
    let mut win_len = s[sfb + 1] - s[sfb];

    let mut i = if sfb == 0 { 0 } else { 36 };
    while i < 576 {
        if i == next_sfb {
            // 把重排好的频带写回原数组
            let dst = 3 * s[sfb];
            is[dst..dst + 3 * win_len].copy_from_slice(&re[..3 * win_len]);

            // rzero 区之后的样本全为零, 无需继续
            if i >= g.count1 {
                return;
            }

            sfb += 1;
            next_sfb = s[sfb + 1] * 3;
            win_len = s[sfb + 1] - s[sfb];
        }
        for win in 0..3 {
            for j in 0..win_len {
                re[j * 3 + win] = is[i];
                i += 1;
            }
        }
    }
    // 最后一个频带
    let dst = 3 * s[12];
    is[dst..dst + 3 * win_len].copy_from_slice(&re[..3 * win_len]);
}
