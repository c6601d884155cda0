//! 元数据标签的跳过与识别.
//!
//! 解码前跳过流头部的标签: 连续的 ID3v2 标签 (10 字节头 +
//! syncsafe 大小的标签体) 以及出现在头部的 ID3v1 ("TAG", 128 字节).
//! 尾部的 ID3v1/APEv2 标签无需显式跳过: 有界同步搜索会把尾部
//! 非同步字节折算成干净的流结束; 这里只提供形状识别工具.

use log::debug;
use qin_core::QinResult;

use crate::source::Source;

/// APEv2 标签头的前导标识
pub const APE_PREAMBLE: &[u8; 8] = b"APETAGEX";

/// 跳过流头部的所有标签, 停在第一个音频字节上
pub fn skip_leading_tags(source: &mut Source) -> QinResult<()> {
    loop {
        let mut head = [0u8; 3];
        source.read_full(&mut head)?;

        match &head {
            b"TAG" => {
                // ID3v1: 总长 128 字节
                source.skip(125)?;
                debug!("跳过头部 ID3v1 标签");
            }
            b"ID3" => {
                // ID3v2: 版本(2) + 标志(1) + syncsafe 大小(4)
                let mut rest = [0u8; 7];
                source.read_full(&mut rest)?;
                let size = syncsafe_size(&rest[3..7]);
                source.skip(size)?;
                debug!("跳过 ID3v2 标签, 体积 {} 字节", 10 + size);
            }
            _ => {
                source.unread(&head);
                return Ok(());
            }
        }
    }
}

/// ID3v2 的 4 字节 syncsafe 整数 (每字节 7 位有效)
fn syncsafe_size(bytes: &[u8]) -> u64 {
    (u64::from(bytes[0] & 0x7F) << 21)
        | (u64::from(bytes[1] & 0x7F) << 14)
        | (u64::from(bytes[2] & 0x7F) << 7)
        | u64::from(bytes[3] & 0x7F)
}

/// 数据是否以 APEv2 标签头开始
pub fn is_ape_tag(data: &[u8]) -> bool {
    data.len() >= 8 && &data[..8] == APE_PREAMBLE
}

/// 数据是否为 ID3v1 尾部标签 (128 字节, "TAG" 开头)
pub fn is_id3v1_tag(data: &[u8]) -> bool {
    data.len() >= 3 && &data[..3] == b"TAG"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id3v2(body_len: usize) -> Vec<u8> {
        let mut tag = vec![b'I', b'D', b'3', 4, 0, 0];
        tag.push(((body_len >> 21) & 0x7F) as u8);
        tag.push(((body_len >> 14) & 0x7F) as u8);
        tag.push(((body_len >> 7) & 0x7F) as u8);
        tag.push((body_len & 0x7F) as u8);
        tag.extend(std::iter::repeat_n(0u8, body_len));
        tag
    }

    #[test]
    fn test_无标签时不消费字节() {
        let mut s = Source::from_data(vec![0xFF, 0xFB, 0x90, 0x44]);
        skip_leading_tags(&mut s).unwrap();
        assert_eq!(s.pos(), 0);
    }

    #[test]
    fn test_跳过单个id3v2() {
        let mut data = id3v2(16);
        data.extend_from_slice(&[0xFF, 0xFB]);
        let total = data.len();
        let mut s = Source::from_data(data);
        skip_leading_tags(&mut s).unwrap();
        assert_eq!(s.pos() as usize, total - 2);
    }

    #[test]
    fn test_跳过连续id3v2标签() {
        // 两个连续 ID3v2 标签合计超过 64 KiB
        let mut data = id3v2(40_000);
        data.extend_from_slice(&id3v2(40_000));
        data.extend_from_slice(&[0xFF, 0xFB]);
        let total = data.len();
        let mut s = Source::from_data(data);
        skip_leading_tags(&mut s).unwrap();
        assert_eq!(s.pos() as usize, total - 2);
    }

    #[test]
    fn test_跳过头部id3v1() {
        let mut data = vec![0u8; 128];
        data[..3].copy_from_slice(b"TAG");
        data.extend_from_slice(&[0xAB, 0xCD]);
        let mut s = Source::from_data(data);
        skip_leading_tags(&mut s).unwrap();
        assert_eq!(s.pos(), 128);
    }

    #[test]
    fn test_形状识别() {
        assert!(is_ape_tag(b"APETAGEX\xd0\x07\x00\x00"));
        assert!(!is_ape_tag(b"APETAG"));
        assert!(is_id3v1_tag(b"TAGxxxx"));
        assert!(!is_id3v1_tag(b"ID3"));
    }
}
