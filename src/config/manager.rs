//! 配置管理器 - 负责用环境变量覆盖文件配置
//!
//! 支持的环境变量：
//! - `MONGODB_SERVICE_HOST` / `MONGODB_PORT`
//! - `ESTHER_SERVER_ADDRESS` / `ESTHER_SERVER_PORT`
//! - `ESTHER_STORAGE_BACKEND`（`mongodb` 或 `memory`）
//! - `ESTHER_ENV`：选择 `environments/{name}.toml` 片段，未设置时不合并

use std::env;

use anyhow::{Context, Result};

use super::EstherConfig;

pub(crate) const ENV_MONGODB_HOST: &str = "MONGODB_SERVICE_HOST";
pub(crate) const ENV_MONGODB_PORT: &str = "MONGODB_PORT";
const ENV_SERVER_ADDRESS: &str = "ESTHER_SERVER_ADDRESS";
const ENV_SERVER_PORT: &str = "ESTHER_SERVER_PORT";
const ENV_STORAGE_BACKEND: &str = "ESTHER_STORAGE_BACKEND";
const ENV_ENVIRONMENT: &str = "ESTHER_ENV";

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 当前环境名称（`ESTHER_ENV`），空值视为未设置
    pub fn environment() -> Option<String> {
        env::var(ENV_ENVIRONMENT)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// 使用进程环境变量覆盖配置
    pub fn apply_environment_overrides(config: &mut EstherConfig) -> Result<()> {
        Self::apply_overrides_with(config, |key| env::var(key).ok())
    }

    /// 使用给定的查找函数覆盖配置，空值视为未设置
    pub fn apply_overrides_with<F>(config: &mut EstherConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = lookup(ENV_MONGODB_HOST) {
            config.mongodb.host = Some(host);
        }
        if let Some(port) = lookup(ENV_MONGODB_PORT) {
            let port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{ENV_MONGODB_PORT} must be a port number, got {port:?}"))?;
            config.mongodb.port = Some(port);
        }
        if let Some(address) = lookup(ENV_SERVER_ADDRESS) {
            config.server.address = address;
        }
        if let Some(port) = lookup(ENV_SERVER_PORT) {
            config.server.port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{ENV_SERVER_PORT} must be a port number, got {port:?}"))?;
        }
        if let Some(backend) = lookup(ENV_STORAGE_BACKEND) {
            config.storage.backend = backend.parse()?;
        }

        Ok(())
    }
}
