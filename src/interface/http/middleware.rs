use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use super::error::ApiError;

/// 本地管理命令只允许回环地址访问
pub async fn require_loopback(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_ip = addr.ip().to_canonical();
    info!(%client_ip, "checking localhost by IP");

    if !client_ip.is_loopback() {
        return Err(ApiError::Unauthorized(format!(
            "{client_ip} is not authorized for this action"
        )));
    }
    Ok(next.run(request).await)
}
