//! MP3 Huffman 解码器.
//!
//! 从显式 (码字, 码长) 表构建前缀树, 按位游走解码.
//! Big-values 表输出 (x, y) 对, count1 表输出 (v, w, x, y) 四元组;
//! 转义值 (表 16-31, 值 15) 追加 linbits 线性扩展位, 非零值后跟符号位.

use std::sync::OnceLock;

use qin_core::{BitReader, QinError, QinResult};

use crate::huffman_tables::{self, HUFFMAN_TABLE_PARAMS, QUAD_A_BITS, QUAD_A_CODES};

/// 前缀树节点: 分支或叶子 (解码符号)
#[derive(Debug, Clone, Copy)]
enum Node {
    /// [0 分支, 1 分支] 的节点下标, 0 表示空缺
    Branch([u16; 2]),
    Leaf(u8),
}

/// 单张码表的前缀树
#[derive(Debug, Clone, Default)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// 先到先得地插入码字; 与已有前缀冲突的条目被丢弃,
    /// 保证树始终良构.
    fn build(codes: &[u16], bits: &[u8], xsize: usize) -> Self {
        let mut nodes = vec![Node::Branch([0, 0])];
        'entry: for (i, (&code, &len)) in codes.iter().zip(bits.iter()).enumerate() {
            if len == 0 {
                continue;
            }
            let symbol = (((i / xsize) as u8) << 4) | (i % xsize) as u8;
            let mut idx = 0usize;
            for bit in (0..len).rev() {
                let b = ((u32::from(code) >> bit) & 1) as usize;
                let next = match nodes[idx] {
                    Node::Branch(children) => children[b] as usize,
                    Node::Leaf(_) => continue 'entry,
                };
                if next == 0 {
                    let new_idx = nodes.len();
                    nodes.push(if bit == 0 {
                        Node::Leaf(symbol)
                    } else {
                        Node::Branch([0, 0])
                    });
                    if let Node::Branch(ref mut children) = nodes[idx] {
                        children[b] = new_idx as u16;
                    }
                    idx = new_idx;
                } else if bit == 0 {
                    // 终点已被占用
                    continue 'entry;
                } else {
                    idx = next;
                }
            }
        }
        Self { nodes }
    }

    /// 按位游走至叶子; 码字无匹配时报告 [`QinError::InvalidHuffmanCode`]
    fn walk(&self, reader: &mut BitReader) -> QinResult<u8> {
        let mut idx = 0usize;
        loop {
            match self.nodes[idx] {
                Node::Leaf(symbol) => return Ok(symbol),
                Node::Branch(children) => {
                    let b = reader.bit() as usize;
                    let next = children[b] as usize;
                    if next == 0 {
                        return Err(QinError::InvalidHuffmanCode(format!(
                            "前缀无匹配 (节点 {idx}, 位 {b})"
                        )));
                    }
                    idx = next;
                }
            }
        }
    }
}

/// 32 张 big-values 前缀树 (表 0/4/14 为空树)
static BIG_VALUE_TREES: OnceLock<Vec<Tree>> = OnceLock::new();
/// Count1 Table A 前缀树
static QUAD_A_TREE: OnceLock<Tree> = OnceLock::new();

fn big_value_trees() -> &'static [Tree] {
    BIG_VALUE_TREES.get_or_init(|| {
        (0..32)
            .map(|id| match huffman_tables::codebook(id) {
                Some((codes, bits, xsize)) => Tree::build(codes, bits, xsize),
                None => Tree::default(),
            })
            .collect()
    })
}

fn quad_a_tree() -> &'static Tree {
    QUAD_A_TREE.get_or_init(|| {
        let codes: Vec<u16> = QUAD_A_CODES.iter().map(|&c| u16::from(c)).collect();
        // xsize=16 使符号直接等于条目下标 (0-15)
        Tree::build(&codes, &QUAD_A_BITS, 16)
    })
}

/// 解码一个 big-values 符号对 (x, y)
///
/// 表 0 不消费比特, 恒输出 (0, 0).
pub fn decode_big_values(reader: &mut BitReader, table_id: usize) -> QinResult<(f32, f32)> {
    let (xsize, linbits) = HUFFMAN_TABLE_PARAMS[table_id];
    if xsize == 0 {
        return Ok((0.0, 0.0));
    }

    let symbol = big_value_trees()[table_id].walk(reader)?;
    let mut x = i32::from(symbol >> 4);
    let mut y = i32::from(symbol & 0x0F);

    // 转义值: x/y == 15 时追加 linbits 位线性扩展
    if x == 15 && linbits > 0 {
        x += reader.bits(linbits) as i32;
    }
    if x != 0 && reader.bit() == 1 {
        x = -x;
    }
    if y == 15 && linbits > 0 {
        y += reader.bits(linbits) as i32;
    }
    if y != 0 && reader.bit() == 1 {
        y = -y;
    }

    Ok((x as f32, y as f32))
}

/// 解码一个 count1 四元组 (v, w, x, y)
///
/// `table_id` 为 32 (Table A) 或 33 (Table B, 固定 4 位码:
/// 码字按位取反即符号). 每个非零分量后跟 1 个符号位,
/// 读取顺序固定为 v, w, x, y.
pub fn decode_count1(reader: &mut BitReader, table_id: usize) -> QinResult<(f32, f32, f32, f32)> {
    let symbol = if table_id == 33 {
        15 - (reader.bits(4) as u8)
    } else {
        quad_a_tree().walk(reader)?
    };

    let mut quad = [0.0f32; 4];
    for (i, q) in quad.iter_mut().enumerate() {
        if (symbol >> (3 - i)) & 1 != 0 {
            *q = if reader.bit() == 1 { -1.0 } else { 1.0 };
        }
    }
    let [v, w, x, y] = quad;
    Ok((v, w, x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ISO 11172-3 Table B.7, 码表 1:
    /// (0,0)=「1」 (1,0)=「01」 (0,1)=「001」 (1,1)=「000」
    #[test]
    fn test_表1_已知码字() {
        // 1 | 01 0 | 001 0 | 000 0 0 | (符号位均为正)
        // = 1010 0010 0000 0...
        let mut r = BitReader::new(vec![0xA2, 0x00, 0x00]);
        assert_eq!(decode_big_values(&mut r, 1).unwrap(), (0.0, 0.0));
        assert_eq!(decode_big_values(&mut r, 1).unwrap(), (1.0, 0.0));
        assert_eq!(decode_big_values(&mut r, 1).unwrap(), (0.0, 1.0));
        assert_eq!(decode_big_values(&mut r, 1).unwrap(), (1.0, 1.0));
    }

    #[test]
    fn test_表1_符号位() {
        // 000 (1,1) + sign_x=1 (负) + sign_y=0 (正)
        let mut r = BitReader::new(vec![0b0001_0000, 0x00]);
        assert_eq!(decode_big_values(&mut r, 1).unwrap(), (-1.0, 1.0));
    }

    #[test]
    fn test_表0_不消费比特() {
        let mut r = BitReader::new(vec![0xFF]);
        assert_eq!(decode_big_values(&mut r, 0).unwrap(), (0.0, 0.0));
        assert_eq!(r.bit_pos(), 0);
    }

    #[test]
    fn test_表24_短码() {
        // 表 24: (0,0)=「1111」, (0,1)=「1101」, (1,0)=「1110」
        // (非零值后跟符号位)
        let mut r = BitReader::new(vec![0b1111_0000]);
        assert_eq!(decode_big_values(&mut r, 24).unwrap(), (0.0, 0.0));
        let mut r = BitReader::new(vec![0b1101_0000]);
        assert_eq!(decode_big_values(&mut r, 24).unwrap(), (0.0, 1.0));
        let mut r = BitReader::new(vec![0b1110_0000]);
        assert_eq!(decode_big_values(&mut r, 24).unwrap(), (1.0, 0.0));
    }

    #[test]
    fn test_count1_表B() {
        // Table B: 4 位码字取反, 1011 → 符号 0100 → w 非零, 符号位 1 → 负
        let mut r = BitReader::new(vec![0b1011_1000]);
        let (v, w, x, y) = decode_count1(&mut r, 33).unwrap();
        assert_eq!((v, w, x, y), (0.0, -1.0, 0.0, 0.0));
        assert_eq!(r.bit_pos(), 5);
    }

    #[test]
    fn test_count1_表A_全零() {
        // Table A: 符号 0 (v=w=x=y=0) 的码字为「1」, 无符号位
        let mut r = BitReader::new(vec![0b1000_0000]);
        let (v, w, x, y) = decode_count1(&mut r, 32).unwrap();
        assert_eq!((v, w, x, y), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(r.bit_pos(), 1);
    }

    #[test]
    fn test_count1_表A_全一() {
        // 符号 15 (全非零) 的码字为「000001」, 后跟 4 个符号位
        let mut r = BitReader::new(vec![0b0000_0110, 0b1000_0000]);
        let (v, w, x, y) = decode_count1(&mut r, 32).unwrap();
        assert_eq!((v, w, x, y), (-1.0, 1.0, -1.0, 1.0));
        assert_eq!(r.bit_pos(), 10);
    }
}
