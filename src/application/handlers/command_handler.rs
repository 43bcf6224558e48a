//! 命令处理器（编排层）- 负责处理命令，调用仓储与回放器

use tracing::{info, instrument, warn};

use crate::application::commands::{
    ApplyEventCallbackCommand, ApplyFailure, ApplyPlanCallbacksCommand, ApplyReport,
    CreateEventCallbackCommand, DeleteEventCallbackCommand, DeletePlanCallbacksCommand,
    UpdateEventCallbackCommand,
};
use crate::domain::{CallbackDispatcherRef, EventCallback, EventCallbackRepositoryRef};
use crate::error::{ApplyError, StoreError};

/// 事件回调命令处理器
pub struct EventCallbackCommandHandler {
    repository: EventCallbackRepositoryRef,
    dispatcher: CallbackDispatcherRef,
}

impl EventCallbackCommandHandler {
    pub fn new(repository: EventCallbackRepositoryRef, dispatcher: CallbackDispatcherRef) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    #[instrument(skip(self, command), fields(plan_id = %command.plan_id))]
    pub async fn handle_create(
        &self,
        command: CreateEventCallbackCommand,
    ) -> Result<EventCallback, StoreError> {
        self.repository
            .create(&command.plan_id, command.callback)
            .await
    }

    #[instrument(skip(self, command), fields(plan_id = %command.plan_id, event_id = %command.event_id))]
    pub async fn handle_update(
        &self,
        command: UpdateEventCallbackCommand,
    ) -> Result<EventCallback, StoreError> {
        self.repository
            .update(&command.plan_id, &command.event_id, command.patch)
            .await
    }

    #[instrument(skip(self, command), fields(plan_id = %command.plan_id, event_id = %command.event_id))]
    pub async fn handle_delete(&self, command: DeleteEventCallbackCommand) -> Result<(), StoreError> {
        self.repository
            .delete_one(&command.plan_id, &command.event_id)
            .await
    }

    #[instrument(skip(self, command), fields(plan_id = %command.plan_id))]
    pub async fn handle_delete_plan(
        &self,
        command: DeletePlanCallbacksCommand,
    ) -> Result<u64, StoreError> {
        self.repository.delete_all_by_plan(&command.plan_id).await
    }

    #[instrument(skip(self, command), fields(plan_id = %command.plan_id, event_id = %command.event_id))]
    pub async fn handle_apply(&self, command: ApplyEventCallbackCommand) -> Result<(), ApplyError> {
        let callback = self
            .repository
            .find_one(&command.plan_id, &command.event_id)
            .await?;
        let deadline = command
            .deadline
            .unwrap_or_else(|| self.dispatcher.default_deadline());

        self.dispatcher.apply(&callback, deadline).await?;
        Ok(())
    }

    /// 依次回放计划下的全部回调，单条失败不会中断其余回调
    #[instrument(skip(self, command), fields(plan_id = %command.plan_id))]
    pub async fn handle_apply_plan(
        &self,
        command: ApplyPlanCallbacksCommand,
    ) -> Result<ApplyReport, StoreError> {
        let callbacks = self.repository.find_all_by_plan(&command.plan_id).await?;
        let deadline = command
            .deadline
            .unwrap_or_else(|| self.dispatcher.default_deadline());

        let mut report = ApplyReport::default();
        for callback in &callbacks {
            match self.dispatcher.apply(callback, deadline).await {
                Ok(()) => report.applied.push(callback.id.clone()),
                Err(err) => report.failed.push(ApplyFailure {
                    id: callback.id.clone(),
                    status: err.status(),
                    error: err.to_string(),
                }),
            }
        }

        if report.is_success() {
            info!(applied = report.applied.len(), "plan callbacks applied to parent");
        } else {
            warn!(
                applied = report.applied.len(),
                failed = report.failed.len(),
                "some plan callbacks could not be applied"
            );
        }
        Ok(report)
    }
}
