//! Esther 配置模块
//!
//! 该模块提供应用配置的加载与解析：
//! - 单个 TOML 文件，或包含 `base.toml` 与 `overrides/*.toml` 的目录
//! - 目录下可选的环境片段 `environments/{ESTHER_ENV}.toml`，仅在设置了 `ESTHER_ENV` 时合并
//! - 环境变量覆盖（见 [`ConfigManager`]）
//! - 服务、MongoDB、存储后端、WebHook 与日志配置

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 服务监听配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

/// MongoDB 实例配置
#[derive(Debug, Clone, Deserialize)]
pub struct MongoInstanceConfig {
    /// 主机名（对应环境变量 MONGODB_SERVICE_HOST）
    #[serde(default)]
    pub host: Option<String>,
    /// 端口（对应环境变量 MONGODB_PORT）
    #[serde(default)]
    pub port: Option<u16>,
    /// 数据库名称
    #[serde(default = "default_database")]
    pub database: String,
    /// 单次操作超时（秒）
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MongoInstanceConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            database: default_database(),
            timeout_seconds: default_store_timeout(),
        }
    }
}

impl MongoInstanceConfig {
    /// 组装连接 URI；缺少的配置项会全部列出
    pub fn connection_uri(&self) -> Result<String> {
        let mut missing = Vec::new();
        let host = self.host.as_deref().filter(|host| !host.is_empty());
        if host.is_none() {
            missing.push(format!("{} is not set", manager::ENV_MONGODB_HOST));
        }
        if self.port.is_none() {
            missing.push(format!("{} is not set", manager::ENV_MONGODB_PORT));
        }

        match (host, self.port) {
            (Some(host), Some(port)) => Ok(format!("mongodb://{host}:{port}/")),
            _ => Err(anyhow!(
                "the persistence environment is not properly set: {}",
                missing.join(", ")
            )),
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongodb,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// WebHook 回放配置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// 默认截止时间（秒）
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_webhook_timeout(),
        }
    }
}

impl WebhookConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub with_target: bool,
    #[serde(default)]
    pub with_thread_ids: bool,
    #[serde(default)]
    pub with_file: bool,
    #[serde(default)]
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// Esther 应用配置主结构体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstherConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mongodb: MongoInstanceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EstherConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut cfg: EstherConfig = toml::from_str(content).context("invalid config format")?;
        cfg.ensure_defaults();
        Ok(cfg)
    }

    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.server.address.is_empty() {
            self.server.address = default_address();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.mongodb.database.is_empty() {
            self.mongodb.database = default_database();
        }
        if self.mongodb.timeout_seconds == 0 {
            self.mongodb.timeout_seconds = default_store_timeout();
        }
    }
}

/// 加载配置：读取文件或目录，再应用环境变量覆盖
pub fn load_config(path: Option<&str>) -> Result<EstherConfig> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    let environment = ConfigManager::environment();
    let mut cfg = load_with_fallback(&candidates, environment.as_deref());
    ConfigManager::apply_environment_overrides(&mut cfg)?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf], environment: Option<&str>) -> EstherConfig {
    for path in candidates {
        match load_config_from_source(path, environment) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err:#}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    EstherConfig::default()
}

/// 从源加载配置
fn load_config_from_source(path: &Path, environment: Option<&str>) -> Result<EstherConfig> {
    if !path.exists() {
        bail!("configuration path {} does not exist", path.display());
    }

    if path.is_dir() {
        load_config_from_directory(path, environment)
    } else {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file: {}", path.display()))?;
        EstherConfig::from_toml_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }
}

/// 从目录加载配置：`base.toml`，`overrides/` 中按文件名排序的片段，最后是环境片段
fn load_config_from_directory(path: &Path, environment: Option<&str>) -> Result<EstherConfig> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        bail!("missing base configuration: {}", base_file.display());
    }

    let mut merged = load_toml_value(&base_file)?;
    if !merged.is_table() {
        bail!("base configuration must be a table: {}", base_file.display());
    }

    merge_directory(&mut merged, &path.join("overrides"))?;

    if let Some(environment) = environment {
        let env_file = path.join("environments").join(format!("{environment}.toml"));
        if !env_file.exists() {
            bail!("missing environment configuration: {}", env_file.display());
        }
        merge_value(&mut merged, load_toml_value(&env_file)?);
    }

    let mut cfg: EstherConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration after merging {}", path.display()))?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 合并目录中的配置
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort();

    for entry in entries {
        let value = load_toml_value(&entry)?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值：表逐键递归合并，其余类型直接覆盖
fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database() -> String {
    "esther".to_string()
}

fn default_store_timeout() -> u64 {
    10
}

fn default_webhook_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
