//! 领域层：事件回调模型、实体能力契约与端口定义

pub mod entity;
pub mod model;
pub mod repository;

pub use entity::Entity;
pub use model::{Action, EventCallback};
pub use repository::{
    CallbackDispatcher, CallbackDispatcherRef, EventCallbackRepository, EventCallbackRepositoryRef,
};
