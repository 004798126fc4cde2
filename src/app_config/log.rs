//! 日志初始化
//!
//! 控制台 + 滚动文件双输出，RUST_LOG 控制过滤级别。

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use super::env::env_or_default;

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// 设置全局日志订阅器（幂等：重复调用直接返回）
pub fn setup_logging() -> anyhow::Result<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let log_dir = env_or_default("LOG_DIR", "logs");
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "quant_replay.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .ok();

    LOG_GUARD.set(guard).ok();
    Ok(())
}
