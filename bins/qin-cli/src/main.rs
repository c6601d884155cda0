//! qin-cli - MP3 解码命令行工具.
//!
//! 把 MP3 解码为 WAV, 或探测流信息 (时长、采样率、Xing/LAME
//! gapless 参数), 支持 JSON 输出.

use clap::Parser;
use serde::Serialize;
use std::process;

use qin_codec::FrameHeader;
use qin_format::{Decoder, Source, WavWriter, lameinfo};

mod logging;

/// Qin MP3 解码工具
#[derive(Parser, Debug)]
#[command(name = "qin-cli", version, about = "纯 Rust MP3 解码器")]
struct Cli {
    /// 输入 MP3 文件路径
    input: String,

    /// 输出 WAV 文件路径
    #[arg(short, long)]
    output: Option<String>,

    /// 仅显示流信息, 不解码
    #[arg(long)]
    info: bool,

    /// 以 JSON 格式输出信息
    #[arg(long)]
    json: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 流信息输出
#[derive(Serialize)]
struct StreamInfo {
    filename: String,
    sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pcm_bytes: Option<u64>,
    frames: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoder_delay: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoder_padding: Option<u16>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("qin-cli: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = Source::open(&cli.input)?;
    let mut decoder = Decoder::new(source)?;

    let lame = read_lame_info(&cli.input, &decoder);
    let info = StreamInfo {
        filename: cli.input.clone(),
        sample_rate: decoder.sample_rate(),
        duration_seconds: decoder.duration().map(|d| d.as_secs_f64()),
        pcm_bytes: decoder.length(),
        frames: decoder.frame_starts().len(),
        encoder: lame.as_ref().and_then(|l| l.lame_version.clone()),
        encoder_delay: lame.as_ref().map(|l| l.encoder_delay),
        encoder_padding: lame.as_ref().map(|l| l.encoder_padding),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(&info);
    }

    if cli.info {
        return Ok(());
    }

    let output = match &cli.output {
        Some(path) => path.clone(),
        None => {
            let stem = cli.input.trim_end_matches(".mp3");
            format!("{stem}.wav")
        }
    };

    let file = std::fs::File::create(&output)?;
    let mut wav = WavWriter::new(std::io::BufWriter::new(file), decoder.sample_rate(), 2)?;

    let mut chunk = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = decoder.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        wav.write_samples(&chunk[..n])?;
        total += n as u64;
    }
    wav.finalize()?;

    if !cli.json {
        println!("已解码 {total} 字节 PCM → {output}");
    }
    Ok(())
}

fn print_info(info: &StreamInfo) {
    println!("文件:     {}", info.filename);
    println!("采样率:   {} Hz", info.sample_rate);
    if let Some(d) = info.duration_seconds {
        println!("时长:     {d:.3} 秒");
    }
    println!("帧数:     {}", info.frames);
    if let Some(enc) = &info.encoder {
        println!("编码器:   {enc}");
        if let (Some(delay), Some(padding)) = (info.encoder_delay, info.encoder_padding) {
            println!("gapless:  delay={delay}, padding={padding}");
        }
    }
}

/// 读取第一个音频帧并解析 Xing/LAME 头
fn read_lame_info(path: &str, decoder: &Decoder) -> Option<lameinfo::LameInfo> {
    let &start = decoder.frame_starts().first()?;
    let mut source = Source::open(path).ok()?;
    source.seek_to(start).ok()?;

    let mut head = [0u8; 4];
    source.read_full(&mut head).ok()?;
    let header = FrameHeader::parse(u32::from_be_bytes(head)).ok()?;

    let mut frame = vec![0u8; header.frame_size()];
    frame[..4].copy_from_slice(&head);
    source.read_full(&mut frame[4..]).ok()?;
    lameinfo::parse(&frame)
}
