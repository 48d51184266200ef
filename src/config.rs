//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::chain_config::ChainRegistry;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub ansi: bool,
}

/// 活跃账户扫描配置
///
/// 连续不活跃阈值是产品层面的调优参数，不是协议要求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 连续多少个不活跃账户后停止
    pub max_consecutive_inactive: u32,
    /// 起始索引（账户 0 总是视为活跃）
    pub start_index: u32,
    /// 最多扫描多少个索引
    pub max_scan: u32,
    /// 查询交易历史所用的参考网络（EVM chain id）
    pub reference_chain_id: i64,
}

/// 网络配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 开发者模式（测试网）
    pub is_testnet: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            ansi: std::env::var("LOG_ANSI")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_consecutive_inactive: std::env::var("SCAN_MAX_CONSECUTIVE_INACTIVE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            start_index: std::env::var("SCAN_START_INDEX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            max_scan: std::env::var("SCAN_MAX_SCAN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            reference_chain_id: std::env::var("SCAN_REFERENCE_CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(43114),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            is_testnet: std::env::var("IS_TESTNET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            scan: ScanConfig::default(),
            network: NetworkConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                // 文件中缺失的段落由环境变量默认值填充
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.scan.max_consecutive_inactive == 0 {
            anyhow::bail!("SCAN_MAX_CONSECUTIVE_INACTIVE must be at least 1");
        }

        if self.scan.max_scan == 0 {
            anyhow::bail!("SCAN_MAX_SCAN must be at least 1");
        }

        // 参考网络必须是已注册的 EVM 网络
        if ChainRegistry::builtin()
            .get_evm_chain(self.scan.reference_chain_id)
            .is_none()
        {
            anyhow::bail!(
                "SCAN_REFERENCE_CHAIN_ID {} is not a registered EVM network",
                self.scan.reference_chain_id
            );
        }

        Ok(())
    }
}
