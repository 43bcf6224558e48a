//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建存储句柄、网关、仓储、回放器与处理器。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::{EventCallbackCommandHandler, EventCallbackQueryHandler};
use crate::config::{EstherConfig, StorageBackend};
use crate::domain::{CallbackDispatcherRef, EventCallbackRepositoryRef};
use crate::infrastructure::adapters::WebhookDispatcher;
use crate::infrastructure::persistence::{
    DocumentGateway, DocumentStoreRef, GatewayEventCallbackRepository, InMemoryDocumentStore,
    MongoDocumentStore,
};
use crate::interface::http::AppState;

/// 应用上下文 - 包含所有已初始化的组件
pub struct ApplicationContext {
    pub state: AppState,
}

/// 构建应用上下文
pub async fn initialize(config: &EstherConfig) -> Result<ApplicationContext> {
    // 1. 存储句柄
    let store = build_store(config).await?;

    // 2. 网关与仓储
    let gateway = Arc::new(DocumentGateway::new(
        store,
        config.mongodb.operation_timeout(),
    ));
    let repository: EventCallbackRepositoryRef =
        Arc::new(GatewayEventCallbackRepository::new(gateway.clone()));

    // 3. WebHook 回放器
    let dispatcher: CallbackDispatcherRef = Arc::new(
        WebhookDispatcher::new(config.webhook.deadline())
            .context("failed to build webhook dispatcher")?,
    );

    // 4. 应用层处理器
    let state = AppState {
        query_handler: Arc::new(EventCallbackQueryHandler::new(repository.clone())),
        command_handler: Arc::new(EventCallbackCommandHandler::new(repository, dispatcher)),
        gateway,
    };

    Ok(ApplicationContext { state })
}

async fn build_store(config: &EstherConfig) -> Result<DocumentStoreRef> {
    match config.storage.backend {
        StorageBackend::Mongodb => {
            let uri = config.mongodb.connection_uri()?;
            info!(
                uri = %uri,
                database = %config.mongodb.database,
                "using mongodb document store"
            );
            let store = MongoDocumentStore::connect(&uri, &config.mongodb.database)
                .await
                .context("failed to connect to mongodb")?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("using in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}
