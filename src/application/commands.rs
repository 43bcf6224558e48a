use std::time::Duration;

use serde::Serialize;

use crate::domain::EventCallback;

pub struct CreateEventCallbackCommand {
    pub plan_id: String,
    pub callback: EventCallback,
}

pub struct UpdateEventCallbackCommand {
    pub plan_id: String,
    pub event_id: String,
    pub patch: EventCallback,
}

pub struct DeleteEventCallbackCommand {
    pub plan_id: String,
    pub event_id: String,
}

pub struct DeletePlanCallbacksCommand {
    pub plan_id: String,
}

/// 把一条回调应用到父计划；`deadline` 为空时使用回放器的默认值
pub struct ApplyEventCallbackCommand {
    pub plan_id: String,
    pub event_id: String,
    pub deadline: Option<Duration>,
}

/// 把计划下的全部回调依次应用到父计划
pub struct ApplyPlanCallbacksCommand {
    pub plan_id: String,
    pub deadline: Option<Duration>,
}

/// 批量回放结果
#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    pub failed: Vec<ApplyFailure>,
}

#[derive(Debug, Serialize)]
pub struct ApplyFailure {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
