//! HTTP 服务器：路由装配与优雅停机

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::middleware;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::handlers;
use super::middleware::require_loopback;
use crate::application::{EventCallbackCommandHandler, EventCallbackQueryHandler};
use crate::infrastructure::persistence::DocumentGateway;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub query_handler: Arc<EventCallbackQueryHandler>,
    pub command_handler: Arc<EventCallbackCommandHandler>,
    pub gateway: Arc<DocumentGateway>,
}

/// 构建完整路由；`/reset` 只对回环地址开放
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/reset", get(handlers::reset))
        .route_layer(middleware::from_fn(require_loopback));

    let callback_routes = Router::new()
        .route(
            "/plans/{plan_id}/eventCallbacks",
            get(handlers::list_callbacks)
                .post(handlers::create_callback)
                .delete(handlers::delete_callbacks),
        )
        .route(
            "/plans/{plan_id}/eventCallbacks/{event_id}",
            get(handlers::get_callback)
                .put(handlers::update_callback)
                .delete(handlers::delete_callback),
        )
        .route(
            "/plans/{plan_id}/eventCallbacks/{event_id}/apply",
            put(handlers::apply_callback),
        )
        .route(
            "/plans/{plan_id}/eventCallbacksToParent",
            put(handlers::apply_callbacks_to_parent),
        );

    Router::new()
        .route("/", get(handlers::health_check))
        .route("/ready", get(handlers::ready_check))
        .merge(admin_routes)
        .merge(callback_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct HttpServer {
    address: SocketAddr,
    router: Router,
}

impl HttpServer {
    pub fn new(address: SocketAddr, state: AppState) -> Self {
        Self {
            address,
            router: router(state),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// 监听直到收到 Ctrl+C 或 SIGTERM
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.address)
            .await
            .with_context(|| format!("failed to bind {}", self.address))?;
        info!(address = %listener.local_addr()?, "esther listening");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server terminated unexpectedly")?;

        info!("esther stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
