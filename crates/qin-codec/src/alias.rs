//! 抗混叠处理 (Alias Reduction).
//!
//! 在相邻子带边界两侧各取 8 个样本做蝴蝶运算, 抵消多相滤波器组
//! 的频谱混叠. 纯短块不做抗混叠; 混合块仅处理最低的 1 个边界.

use crate::side_info::Granule;
use crate::tables::{CA, CS};

/// 对一个 granule/声道做抗混叠, 就地改写频谱
pub fn antialias(g: &Granule, is: &mut [f32; 576]) {
    if g.window_switching_flag && g.block_type == 2 && !g.mixed_block_flag {
        return;
    }

    let sb_limit = if g.window_switching_flag && g.block_type == 2 && g.mixed_block_flag {
        2
    } else {
        32
    };

    for sb in 1..sb_limit {
        for i in 0..8 {
            let li = 18 * sb - 1 - i;
            let ui = 18 * sb + i;
            let lb = is[li] * CS[i] - is[ui] * CA[i];
            let ub = is[ui] * CS[i] + is[li] * CA[i];
            is[li] = lb;
            is[ui] = ub;
        }
    }
}
