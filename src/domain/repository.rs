//! 仓储与回放端口定义（Port）

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::model::EventCallback;
use crate::error::{DispatchError, StoreError};

pub type EventCallbackRepositoryRef = Arc<dyn EventCallbackRepository>;
pub type CallbackDispatcherRef = Arc<dyn CallbackDispatcher>;

/// 事件回调仓储
///
/// 所有单条操作都以 `(plan_id, event_id)` 定位，跨计划访问一律视为不存在。
#[async_trait]
pub trait EventCallbackRepository: Send + Sync {
    /// 按计划列出回调，顺序为存储的自然返回顺序
    async fn find_all_by_plan(&self, plan_id: &str) -> Result<Vec<EventCallback>, StoreError>;

    async fn find_one(&self, plan_id: &str, event_id: &str) -> Result<EventCallback, StoreError>;

    /// 以路径中的 `plan_id` 为准创建，返回带新 id 的记录
    async fn create(
        &self,
        plan_id: &str,
        draft: EventCallback,
    ) -> Result<EventCallback, StoreError>;

    /// 读取、合并、整体替换。该序列不是原子的，并发更新可能互相覆盖。
    async fn update(
        &self,
        plan_id: &str,
        event_id: &str,
        patch: EventCallback,
    ) -> Result<EventCallback, StoreError>;

    async fn delete_one(&self, plan_id: &str, event_id: &str) -> Result<(), StoreError>;

    /// 删除计划下的全部回调，返回删除数量；零条也算成功
    async fn delete_all_by_plan(&self, plan_id: &str) -> Result<u64, StoreError>;
}

/// 回放端口：把回调的 parent 动作发送到目标地址
#[async_trait]
pub trait CallbackDispatcher: Send + Sync {
    /// 默认截止时间
    fn default_deadline(&self) -> Duration;

    async fn apply(
        &self,
        callback: &EventCallback,
        deadline: Duration,
    ) -> Result<(), DispatchError>;
}
