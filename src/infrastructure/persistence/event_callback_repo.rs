//! 基于文档网关的事件回调仓储

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::gateway::DocumentGateway;
use crate::domain::{Entity, EventCallback, EventCallbackRepository};
use crate::error::StoreError;

pub struct GatewayEventCallbackRepository {
    gateway: Arc<DocumentGateway>,
}

impl GatewayEventCallbackRepository {
    pub fn new(gateway: Arc<DocumentGateway>) -> Self {
        Self { gateway }
    }

    fn template(plan_id: &str, event_id: &str) -> EventCallback {
        EventCallback {
            id: event_id.to_string(),
            plan_id: plan_id.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl EventCallbackRepository for GatewayEventCallbackRepository {
    async fn find_all_by_plan(&self, plan_id: &str) -> Result<Vec<EventCallback>, StoreError> {
        self.gateway.find_by_owner::<EventCallback>(plan_id).await
    }

    async fn find_one(&self, plan_id: &str, event_id: &str) -> Result<EventCallback, StoreError> {
        self.gateway
            .find_one(&Self::template(plan_id, event_id))
            .await
    }

    async fn create(
        &self,
        plan_id: &str,
        mut draft: EventCallback,
    ) -> Result<EventCallback, StoreError> {
        draft.plan_id = plan_id.to_string();
        let id = self.gateway.insert_one(&draft).await?;
        Ok(draft.with_reset_identifier(&id))
    }

    async fn update(
        &self,
        plan_id: &str,
        event_id: &str,
        patch: EventCallback,
    ) -> Result<EventCallback, StoreError> {
        let mut callback = self.find_one(plan_id, event_id).await?;
        let (id, owner) = (callback.id.clone(), callback.plan_id.clone());

        callback.merge_from(patch);
        // id 与所属计划不允许被补丁改写
        callback.id = id;
        callback.plan_id = owner;

        // 未匹配已由网关记录
        if !self.gateway.replace_one(&callback).await? {
            return Err(StoreError::Persistence(format!(
                "can't update the event-callback {event_id} in plan {plan_id}"
            )));
        }
        Ok(callback)
    }

    async fn delete_one(&self, plan_id: &str, event_id: &str) -> Result<(), StoreError> {
        // 先确认存在，让调用方能区分"无可删除"和"删除失败"
        self.find_one(plan_id, event_id).await?;

        if !self
            .gateway
            .delete_one(&Self::template(plan_id, event_id))
            .await?
        {
            error!(event_id, plan_id, "event-callback delete removed nothing");
            return Err(StoreError::Persistence(format!(
                "can't delete the event-callback {event_id} in plan {plan_id}"
            )));
        }
        info!(event_id, plan_id, "event-callback deleted");
        Ok(())
    }

    async fn delete_all_by_plan(&self, plan_id: &str) -> Result<u64, StoreError> {
        self.gateway.delete_many::<EventCallback>(plan_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    use mongodb::bson::Document;
    use mongodb::bson::oid::ObjectId;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::infrastructure::persistence::{DocumentStore, InMemoryDocumentStore};

    /// 替换永远匹配不到：模拟读取之后记录被并发删除
    #[derive(Default)]
    struct VanishingStore {
        inner: InMemoryDocumentStore,
    }

    #[async_trait]
    impl DocumentStore for VanishingStore {
        fn backend(&self) -> &'static str {
            "vanishing"
        }

        async fn find_one(
            &self,
            collection: &str,
            filter: Document,
        ) -> Result<Option<Document>, StoreError> {
            self.inner.find_one(collection, filter).await
        }

        async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
            self.inner.find(collection, filter).await
        }

        async fn insert_one(
            &self,
            collection: &str,
            document: Document,
        ) -> Result<ObjectId, StoreError> {
            self.inner.insert_one(collection, document).await
        }

        async fn replace_one(
            &self,
            _collection: &str,
            _filter: Document,
            _replacement: Document,
        ) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
            self.inner.delete_one(collection, filter).await
        }

        async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
            self.inner.delete_many(collection, filter).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn drop_database(&self) -> Result<(), StoreError> {
            self.inner.drop_database().await
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_unmatched_replace_is_logged_once() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = Arc::new(VanishingStore::default());
        let gateway = Arc::new(DocumentGateway::new(store, Duration::from_secs(5)));
        let repo = GatewayEventCallbackRepository::new(gateway);
        let created = repo
            .create(
                "P1",
                EventCallback {
                    title: "reserve".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let patch = EventCallback {
            title: "renamed".to_string(),
            ..Default::default()
        };
        let err = repo.update("P1", &created.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)), "{err}");

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let reports = output
            .lines()
            .filter(|line| line.contains("did not match") || line.contains("matched no document"))
            .count();
        assert_eq!(reports, 1, "{output}");
    }
}
