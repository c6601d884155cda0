//! Qin 解码器性能基准测试.
//!
//! 覆盖帧解码管线与多相合成等核心路径.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qin::format::{Decoder, Source};

/// 构造由 n 个最小合法帧组成的码流
/// (MPEG1 Layer3 128kbps 44100Hz, 全零主数据)
fn make_stream(n: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[..4].copy_from_slice(&0xFFFB_9044u32.to_be_bytes());
    let mut data = Vec::with_capacity(n * frame.len());
    for _ in 0..n {
        data.extend_from_slice(&frame);
    }
    data
}

fn bench_decode_stream(c: &mut Criterion) {
    let data = make_stream(50);
    c.bench_function("decode_50_frames", |b| {
        b.iter(|| {
            let source = Source::from_data(black_box(data.clone()));
            let mut decoder = Decoder::new(source).unwrap();
            let pcm = decoder.read_all().unwrap();
            black_box(pcm);
        });
    });
}

fn bench_construct_with_scan(c: &mut Criterion) {
    let data = make_stream(200);
    c.bench_function("construct_scan_200_frames", |b| {
        b.iter(|| {
            let source = Source::from_data(black_box(data.clone()));
            let decoder = Decoder::new(source).unwrap();
            black_box(decoder.frame_starts().len());
        });
    });
}

fn bench_seek_middle(c: &mut Criterion) {
    let data = make_stream(100);
    c.bench_function("seek_middle_100_frames", |b| {
        let source = Source::from_data(data.clone());
        let mut decoder = Decoder::new(source).unwrap();
        b.iter(|| {
            decoder.seek(std::io::SeekFrom::Start(black_box(50 * 4608))).unwrap();
            let mut buf = [0u8; 4608];
            let _ = decoder.read(&mut buf).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_decode_stream,
    bench_construct_with_scan,
    bench_seek_middle
);
criterion_main!(benches);
