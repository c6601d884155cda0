//! IMDCT 与混合滤波器组 (加窗、重叠相加).
//!
//! 长块 (block_type 0/1/3): 18 点输入经 36 点 IMDCT 后按块类型加窗.
//! 短块 (block_type 2): 三个 12 点 IMDCT, 各自加短窗后以 6 样本
//! 间隔放入 36 样本输出中相加. 每个子带输出的前 18 个样本与上一帧
//! 保存的后 18 个样本重叠相加.

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::side_info::Granule;

/// 四种块类型的 36 点窗口 (0=长, 1=start, 2=短, 3=stop)
static IMDCT_WIN: OnceLock<[[f32; 36]; 4]> = OnceLock::new();
/// 12 点 IMDCT 余弦表
static COS_N12: OnceLock<[[f32; 12]; 6]> = OnceLock::new();
/// 36 点 IMDCT 余弦表
static COS_N36: OnceLock<[[f32; 36]; 18]> = OnceLock::new();

fn imdct_win() -> &'static [[f32; 36]; 4] {
    IMDCT_WIN.get_or_init(|| {
        let mut w = [[0.0f32; 36]; 4];
        for i in 0..36 {
            w[0][i] = (PI / 36.0 * (i as f64 + 0.5)).sin() as f32;
        }
        for i in 0..18 {
            w[1][i] = (PI / 36.0 * (i as f64 + 0.5)).sin() as f32;
        }
        for i in 18..24 {
            w[1][i] = 1.0;
        }
        for i in 24..30 {
            w[1][i] = (PI / 12.0 * (i as f64 + 0.5 - 18.0)).sin() as f32;
        }
        for i in 0..12 {
            w[2][i] = (PI / 12.0 * (i as f64 + 0.5)).sin() as f32;
        }
        for i in 6..12 {
            w[3][i] = (PI / 12.0 * (i as f64 + 0.5 - 6.0)).sin() as f32;
        }
        for i in 12..18 {
            w[3][i] = 1.0;
        }
        for i in 18..36 {
            w[3][i] = (PI / 36.0 * (i as f64 + 0.5)).sin() as f32;
        }
        w
    })
}

fn cos_n12() -> &'static [[f32; 12]; 6] {
    COS_N12.get_or_init(|| {
        let mut t = [[0.0f32; 12]; 6];
        for (i, row) in t.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (PI / 24.0 * (2.0 * j as f64 + 1.0 + 6.0) * (2.0 * i as f64 + 1.0)).cos()
                    as f32;
            }
        }
        t
    })
}

fn cos_n36() -> &'static [[f32; 36]; 18] {
    COS_N36.get_or_init(|| {
        let mut t = [[0.0f32; 36]; 18];
        for (i, row) in t.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (PI / 72.0 * (2.0 * j as f64 + 1.0 + 18.0) * (2.0 * i as f64 + 1.0)).cos()
                    as f32;
            }
        }
        t
    })
}

/// 对一个子带的 18 条频率线做 IMDCT 并加窗, 输出 36 个时域样本
pub fn win(input: &[f32], block_type: usize) -> [f32; 36] {
    let mut out = [0.0f32; 36];
    let iwd = &imdct_win()[block_type];

    if block_type == 2 {
        // 三个 12 点 IMDCT, 输入按频率线交织 (重排序的结果),
        // 输出以 6 样本间隔错位相加
        let cos12 = cos_n12();
        for i in 0..3 {
            for p in 0..12 {
                let mut sum = 0.0f32;
                for (m, row) in cos12.iter().enumerate() {
                    sum += input[i + 3 * m] * row[p];
                }
                out[6 * i + p + 6] += sum * iwd[p];
            }
        }
        return out;
    }

    let cos36 = cos_n36();
    for (p, o) in out.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for (m, row) in cos36.iter().enumerate() {
            sum += input[m] * row[p];
        }
        *o = sum * iwd[p];
    }
    out
}

/// 混合滤波器组: 32 个子带逐一 IMDCT, 与上一帧的尾部重叠相加.
///
/// `store` 为该声道的重叠缓冲区, 本帧输出的后 18 个样本存入其中
/// 供下一帧使用. 混合块的最低 2 个子带按长块 (窗口 0) 处理.
pub fn hybrid_synthesis(g: &Granule, is: &mut [f32; 576], store: &mut [[f32; 18]; 32]) {
    for sb in 0..32 {
        let mut block_type = usize::from(g.block_type);
        if g.window_switching_flag && g.mixed_block_flag && sb < 2 {
            block_type = 0;
        }

        let mut input = [0.0f32; 18];
        input.copy_from_slice(&is[sb * 18..(sb + 1) * 18]);
        let rawout = win(&input, block_type);

        for i in 0..18 {
            is[sb * 18 + i] = rawout[i] + store[sb][i];
            store[sb][i] = rawout[18 + i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_窗口形状() {
        let w = imdct_win();
        // 长窗: 正弦, 对称
        assert!((w[0][0] - (PI / 36.0 * 0.5).sin() as f32).abs() < 1e-6);
        for i in 0..18 {
            assert!((w[0][i] - w[0][35 - i]).abs() < 1e-6);
        }
        // start 窗: 中段平坦, 尾段归零
        assert_eq!(w[1][20], 1.0);
        assert_eq!(w[1][33], 0.0);
        // stop 窗: 头段归零, 中段平坦
        assert_eq!(w[3][2], 0.0);
        assert_eq!(w[3][15], 1.0);
        // 短窗: 12 点之后为零
        assert!(w[2][11] > 0.0);
        assert_eq!(w[2][20], 0.0);
    }

    #[test]
    fn test_零输入零输出() {
        let input = [0.0f32; 18];
        for bt in [0usize, 1, 2, 3] {
            let out = win(&input, bt);
            assert!(out.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_短块输出区间() {
        // 短块输出仅占 [6, 30), 两端各 6 个样本恒为零
        let mut input = [0.0f32; 18];
        input.fill(1.0);
        let out = win(&input, 2);
        assert!(out[..6].iter().all(|&v| v == 0.0));
        assert!(out[30..].iter().all(|&v| v == 0.0));
        assert!(out[6..30].iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_重叠相加与保存() {
        let g = Granule::default();
        let mut store = [[0.0f32; 18]; 32];
        store[0][0] = 1.5;

        let mut is = [0.0f32; 576];
        hybrid_synthesis(&g, &mut is, &mut store);
        // 零输入: 输出即上一帧的重叠部分
        assert_eq!(is[0], 1.5);
        // 本帧尾部 (全零) 已存入 store
        assert_eq!(store[0][0], 0.0);
    }
}
