//! 持久化基础设施
//!
//! - `store`：文档存储后端抽象（连接句柄）
//! - `mongo` / `memory`：两种后端实现
//! - `gateway`：按实体能力契约泛化的 CRUD 网关
//! - `event_callback_repo`：基于网关的事件回调仓储

pub mod event_callback_repo;
pub mod gateway;
pub mod memory;
pub mod mongo;
pub mod store;

pub use event_callback_repo::GatewayEventCallbackRepository;
pub use gateway::DocumentGateway;
pub use memory::InMemoryDocumentStore;
pub use mongo::MongoDocumentStore;
pub use store::{DocumentStore, DocumentStoreRef};
