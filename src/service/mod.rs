//! 服务模块 - 依赖装配与服务启动

pub mod wire;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::EstherConfig;
use crate::interface::http::HttpServer;

pub use wire::{ApplicationContext, initialize};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点，直到收到停机信号
    pub async fn run(config: &EstherConfig) -> Result<()> {
        let address: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
            .parse()
            .context("invalid server address")?;

        let context = initialize(config).await?;
        info!(%address, backend = ?config.storage.backend, "starting esther");

        HttpServer::new(address, context.state).serve().await
    }
}
