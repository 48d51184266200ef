//! 日志系统配置模块
//! 支持 JSON / 文本两种输出格式，级别可由 RUST_LOG 覆盖

use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::LoggingConfig;

/// 初始化日志系统
///
/// 全局 subscriber 已存在时返回错误
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    // 设置日志级别过滤器
    let filter = EnvFilter::try_from_default_env().or_else(|_| config_filter(config))?;

    if config.format == "json" {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true).with_ansi(config.ansi))
            .try_init()?;
    }

    Ok(())
}

/// 配置文件中的级别过滤器
fn config_filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(&config.level)
}

/// 简化初始化（使用默认配置）
pub fn init_default_logging() {
    let config = LoggingConfig::default();
    if let Err(e) = init_logging(&config) {
        eprintln!("Failed to initialize logging: {}", e);
        // 回退到最基本的日志初始化（已初始化时忽略）
        let _ = tracing_subscriber::fmt().try_init();
    }
}
