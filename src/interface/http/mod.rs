//! HTTP 接口层（axum）
//!
//! 只负责路由、请求绑定与错误映射，业务逻辑全部在应用层。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use dto::{ActionBody, CallbackBody};
pub use error::ApiError;
pub use server::{AppState, HttpServer, router};
