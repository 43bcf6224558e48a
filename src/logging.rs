//! 日志初始化
//!
//! 优先使用环境变量 `RUST_LOG`，否则使用配置中的日志级别。
//! 配置加载发生在全局 subscriber 安装之前，期间的日志由临时的引导 subscriber 输出。

use tracing::debug;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 在引导 subscriber 下执行 `f`（输出到 stderr），用于加载配置等早期步骤
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    with_bootstrap_writer(env_filter, std::io::stderr, f)
}

fn with_bootstrap_writer<W, T>(env_filter: EnvFilter, writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f)
}

/// 从配置初始化日志系统
///
/// # 参数
/// * `logging_config` - 日志配置（可选），为 None 时使用默认配置（info 级别）
///
/// # 返回
/// 是否安装了新的全局 subscriber；已存在时返回 `false`
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) -> bool {
    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    match builder.try_init() {
        Ok(()) => true,
        Err(err) => {
            debug!(error = %err, "global tracing subscriber already installed");
            false
        }
    }
}
