//! 端到端集成测试: MP3 码流解码管线.
//!
//! 用内存中构造的最小合法码流 (全零主数据 → 静音 PCM) 验证:
//! 输出长度、标签跳过、尾部垃圾处理、伪同步拒绝与单声道复制.

use qin::format::{Decoder, Source};

/// MPEG1 Layer3 128kbps 44100Hz 联合立体声, 无填充 → 417 字节
fn minimal_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[..4].copy_from_slice(&0xFFFB_9044u32.to_be_bytes());
    frame
}

/// MPEG2 Layer3 80kbps 22050Hz 单声道 → 261 字节
fn mono_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 261];
    frame[..4].copy_from_slice(&0xFFF3_90C0u32.to_be_bytes());
    frame
}

/// 由 n 个最小帧拼出的码流
fn stream_of(n: usize) -> Vec<u8> {
    let frame = minimal_frame();
    let mut data = Vec::with_capacity(n * frame.len());
    for _ in 0..n {
        data.extend_from_slice(&frame);
    }
    data
}

/// ID3v2 标签 (10 字节头 + body)
fn id3v2(body_len: usize) -> Vec<u8> {
    let mut tag = vec![b'I', b'D', b'3', 4, 0, 0];
    tag.push(((body_len >> 21) & 0x7F) as u8);
    tag.push(((body_len >> 14) & 0x7F) as u8);
    tag.push(((body_len >> 7) & 0x7F) as u8);
    tag.push((body_len & 0x7F) as u8);
    tag.extend(std::iter::repeat_n(0u8, body_len));
    tag
}

/// APEv2 尾部标签 (32 字节头 + body)
fn ape_tag(body: &[u8]) -> Vec<u8> {
    let mut tag = Vec::with_capacity(32 + body.len());
    tag.extend_from_slice(b"APETAGEX");
    tag.extend_from_slice(&2000u32.to_le_bytes());
    tag.extend_from_slice(&(body.len() as u32).to_le_bytes());
    tag.extend_from_slice(&1u32.to_le_bytes());
    tag.extend_from_slice(&0xA000_0080u32.to_le_bytes());
    tag.extend_from_slice(&[0u8; 8]);
    tag.extend_from_slice(body);
    tag
}

#[test]
fn test_十帧解码长度() {
    let mut d = Decoder::new(Source::from_data(stream_of(10))).unwrap();
    assert_eq!(d.sample_rate(), 44100);
    assert_eq!(d.length(), Some(10 * 1152 * 4));
    assert_eq!(d.bytes_per_frame(), 4608);
    assert_eq!(d.frame_starts().len(), 10);
    assert_eq!(d.frame_starts()[1], 417);

    let pcm = d.read_all().unwrap();
    assert_eq!(pcm.len(), 46080);
}

#[test]
fn test_尾部垃圾不改变输出() {
    // 10 帧 + 100 KiB 非同步垃圾: 输出仍然只有音频部分
    let mut data = stream_of(10);
    data.extend(std::iter::repeat_n(0u8, 100 * 1024));
    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    assert_eq!(d.length(), Some(46080));
    let pcm = d.read_all().unwrap();
    assert_eq!(pcm.len(), 46080);

    // 再追加垃圾也不改变输出
    let mut data = stream_of(10);
    data.extend(std::iter::repeat_n(0xAAu8, 200 * 1024));
    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    let pcm2 = d.read_all().unwrap();
    assert_eq!(pcm, pcm2);
}

#[test]
fn test_单声道复制为双声道() {
    let frame = mono_frame();
    let mut data = Vec::new();
    for _ in 0..3 {
        data.extend_from_slice(&frame);
    }
    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    assert_eq!(d.sample_rate(), 22050);
    // MPEG2: 每帧 576 采样, 输出仍为双声道
    assert_eq!(d.bytes_per_frame(), 2304);

    let pcm = d.read_all().unwrap();
    assert_eq!(pcm.len(), 3 * 2304);
    for pair in pcm.chunks_exact(4) {
        assert_eq!(&pair[..2], &pair[2..], "单声道输出左右声道应一致");
    }
}

#[test]
fn test_标签夹心() {
    // [ID3v2(16 字节体)] + 10 帧 + [APEv2]
    let mut data = id3v2(16);
    data.extend_from_slice(&stream_of(10));
    data.extend_from_slice(&ape_tag(b"ALBUM\x00Test Album Name"));

    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    assert_eq!(d.length(), Some(46080));
    assert_eq!(d.frame_starts()[0], 26);
    let pcm = d.read_all().unwrap();
    assert_eq!(pcm.len(), 46080);
}

#[test]
fn test_超大连续id3v2标签() {
    // 两个连续 ID3v2 标签合计超过 64 KiB, 仍能构造并解码
    let mut data = id3v2(40_000);
    data.extend_from_slice(&id3v2(40_000));
    data.extend_from_slice(&stream_of(2));

    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    assert_eq!(d.length(), Some(2 * 4608));
    assert_eq!(d.read_all().unwrap().len(), 2 * 4608);
}

#[test]
fn test_layer2伪同步被跳过() {
    // Layer II 帧头 (0xFFFC4200) 不被消费为音频帧
    let mut data = 0xFFFC_4200u32.to_be_bytes().to_vec();
    data.extend_from_slice(&stream_of(3));

    let mut d = Decoder::new(Source::from_data(data)).unwrap();
    assert_eq!(d.frame_starts().len(), 3);
    assert_eq!(d.frame_starts()[0], 4);
    assert_eq!(d.read_all().unwrap().len(), 3 * 4608);
}

#[test]
fn test_不可定位数据源() {
    let data = stream_of(3);
    let mut d = Decoder::new(Source::from_reader(std::io::Cursor::new(data))).unwrap();
    // 不可定位: 无总长度/时长, 但解码照常
    assert_eq!(d.length(), None);
    assert!(d.duration().is_none());
    assert_eq!(d.read_all().unwrap().len(), 3 * 4608);
    assert!(d.seek(std::io::SeekFrom::Start(0)).is_err());
}

#[test]
fn test_流结束后read返回零() {
    let mut d = Decoder::new(Source::from_data(stream_of(1))).unwrap();
    d.read_all().unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(d.read(&mut buf).unwrap(), 0);
    assert_eq!(d.read(&mut buf).unwrap(), 0);
}
