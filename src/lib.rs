//! Esther 事件回调服务
//!
//! 存储按计划归属的事件回调（父操作与撤销操作），并把回调回放到父计划的 WebHook。

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interface;
pub mod logging;
pub mod service;

pub use config::{EstherConfig, load_config};
pub use domain::{Action, Entity, EventCallback};
pub use error::{ApplyError, DispatchError, StoreError};
pub use infrastructure::adapters::WebhookDispatcher;
pub use infrastructure::persistence::{DocumentGateway, GatewayEventCallbackRepository};
pub use logging::{init_tracing_from_config, with_bootstrap_logging};
pub use service::ApplicationBootstrap;
