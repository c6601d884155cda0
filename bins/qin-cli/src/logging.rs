//! 日志初始化.
//!
//! 控制台输出, 默认 info 级别, 由 -v/-vv 或 QIN_LOG 环境变量调整;
//! 库内部的 `log` 记录经 tracing-log 桥接一并输出.

use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// - `verbosity`: 0=info, 1=debug, 2+=trace
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("QIN_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
