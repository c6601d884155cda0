//! 比例因子频带索引与各类固定常量表.
//!
//! 数据来源为 ISO/IEC 11172-3 Table B.8 与 ISO/IEC 13818-3,
//! 按 (是否低采样率, 采样率索引) 组织, 支持直接下标访问.

/// 一组比例因子频带边界: 长块 22 个频带 (23 个边界),
/// 短块 13 个频带 (14 个边界, 以单窗口样本计)
#[derive(Debug, Clone, Copy)]
pub struct SfBandIndices {
    pub l: [usize; 23],
    pub s: [usize; 14],
}

/// 比例因子频带索引表, `[lsf][采样率索引]`
///
/// lsf=0: MPEG-1 (44.1/48/32 kHz); lsf=1: MPEG-2/2.5 (22.05/24/16 kHz,
/// 2.5 复用同组表).
pub const SF_BAND_INDICES: [[SfBandIndices; 3]; 2] = [
    [
        SfBandIndices {
            l: [
                0, 4, 8, 12, 16, 20, 24, 30, 36, 44, 52, 62, 74, 90, 110, 134, 162, 196, 238,
                288, 342, 418, 576,
            ],
            s: [0, 4, 8, 12, 16, 22, 30, 40, 52, 66, 84, 106, 136, 192],
        },
        SfBandIndices {
            l: [
                0, 4, 8, 12, 16, 20, 24, 30, 36, 42, 50, 60, 72, 88, 106, 128, 156, 190, 230,
                276, 330, 384, 576,
            ],
            s: [0, 4, 8, 12, 16, 22, 28, 38, 50, 64, 80, 100, 126, 192],
        },
        SfBandIndices {
            l: [
                0, 4, 8, 12, 16, 20, 24, 30, 36, 44, 54, 66, 82, 102, 126, 156, 194, 240, 296,
                364, 448, 550, 576,
            ],
            s: [0, 4, 8, 12, 16, 22, 30, 42, 58, 78, 104, 138, 180, 192],
        },
    ],
    [
        SfBandIndices {
            l: [
                0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336,
                396, 464, 522, 576,
            ],
            s: [0, 4, 8, 12, 18, 24, 32, 42, 56, 74, 100, 132, 174, 192],
        },
        SfBandIndices {
            l: [
                0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 114, 136, 162, 194, 232, 278, 332,
                394, 464, 540, 576,
            ],
            s: [0, 4, 8, 12, 18, 26, 36, 48, 62, 80, 104, 136, 180, 192],
        },
        SfBandIndices {
            l: [
                0, 6, 12, 18, 24, 30, 36, 44, 54, 66, 80, 96, 116, 140, 168, 200, 238, 284, 336,
                396, 464, 522, 576,
            ],
            s: [0, 4, 8, 12, 18, 26, 36, 48, 62, 80, 104, 134, 174, 192],
        },
    ],
];

/// 每 granule 采样数
pub const SAMPLES_PER_GRANULE: usize = 576;

/// preflag 预加重表 (长块 sfb 0-21)
pub const PRETAB: [u32; 22] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 3, 3, 3, 2, 0,
];

/// MPEG-1 scalefac_compress → (slen1, slen2)
pub const SCALEFAC_SIZES: [(usize, usize); 16] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (3, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (2, 1),
    (2, 2),
    (2, 3),
    (3, 1),
    (3, 2),
    (3, 3),
    (4, 2),
    (4, 3),
];

/// LSF (MPEG-2/2.5) 比例因子分组表 `[行][块类别][组]`.
///
/// 块类别: 0=长块, 1=纯短块, 2=混合块.
/// 行 0-2 为普通声道, 行 3-5 为强度立体声右声道.
pub const LSF_NR_OF_SFB: [[[usize; 4]; 3]; 6] = [
    [[6, 5, 5, 5], [9, 9, 9, 9], [6, 9, 9, 9]],
    [[6, 5, 7, 3], [9, 9, 12, 6], [6, 9, 12, 6]],
    [[11, 10, 0, 0], [18, 18, 0, 0], [15, 18, 0, 0]],
    [[7, 7, 7, 0], [12, 12, 12, 0], [6, 15, 12, 0]],
    [[6, 6, 6, 3], [12, 9, 9, 6], [6, 12, 9, 6]],
    [[8, 8, 5, 0], [15, 12, 9, 0], [6, 18, 9, 0]],
];

/// 抗混叠蝴蝶系数 cs[i] = 1 / sqrt(1 + ci^2)
#[allow(clippy::excessive_precision)]
pub const CS: [f32; 8] = [
    0.8574929257,
    0.8817419973,
    0.9496286491,
    0.9833145925,
    0.9955178161,
    0.9991605582,
    0.9998991952,
    0.9999931551,
];

/// 抗混叠蝴蝶系数 ca[i] = ci / sqrt(1 + ci^2)
#[allow(clippy::excessive_precision)]
pub const CA: [f32; 8] = [
    -0.5144957554,
    -0.4717319684,
    -0.3133774542,
    -0.1819131996,
    -0.0945741925,
    -0.0409655829,
    -0.0141985686,
    -0.0036999747,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_频带表自洽() {
        for group in &SF_BAND_INDICES {
            for t in group {
                assert_eq!(t.l[0], 0);
                assert_eq!(t.l[22], 576);
                assert_eq!(t.s[0], 0);
                assert_eq!(t.s[13], 192);
                assert!(t.l.windows(2).all(|w| w[0] < w[1]));
                assert!(t.s.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
