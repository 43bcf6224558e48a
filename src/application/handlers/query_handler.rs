//! 查询处理器（编排层）

use tracing::instrument;

use crate::application::queries::{GetEventCallbackQuery, ListEventCallbacksQuery};
use crate::domain::{EventCallback, EventCallbackRepositoryRef};
use crate::error::StoreError;

pub struct EventCallbackQueryHandler {
    repository: EventCallbackRepositoryRef,
}

impl EventCallbackQueryHandler {
    pub fn new(repository: EventCallbackRepositoryRef) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, query), fields(plan_id = %query.plan_id))]
    pub async fn handle_list(
        &self,
        query: ListEventCallbacksQuery,
    ) -> Result<Vec<EventCallback>, StoreError> {
        self.repository.find_all_by_plan(&query.plan_id).await
    }

    #[instrument(skip(self, query), fields(plan_id = %query.plan_id, event_id = %query.event_id))]
    pub async fn handle_get(&self, query: GetEventCallbackQuery) -> Result<EventCallback, StoreError> {
        self.repository
            .find_one(&query.plan_id, &query.event_id)
            .await
    }
}
