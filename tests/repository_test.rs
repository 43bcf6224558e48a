// 仓储集成测试 - 基于内存存储验证计划隔离、合并、删除语义与超时
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use esther_callbacks::domain::{Action, EventCallback, EventCallbackRepository};
use esther_callbacks::error::StoreError;
use esther_callbacks::infrastructure::persistence::{
    DocumentGateway, DocumentStore, DocumentStoreRef, GatewayEventCallbackRepository,
    InMemoryDocumentStore,
};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use tokio::sync::Barrier;

fn repository_over(store: DocumentStoreRef, timeout: Duration) -> GatewayEventCallbackRepository {
    GatewayEventCallbackRepository::new(Arc::new(DocumentGateway::new(store, timeout)))
}

fn repository() -> GatewayEventCallbackRepository {
    repository_over(Arc::new(InMemoryDocumentStore::new()), Duration::from_secs(5))
}

fn draft(title: &str) -> EventCallback {
    EventCallback {
        title: title.to_string(),
        undo: Action {
            method: "DELETE".to_string(),
            uri: "http://plans.local/P0/items/1".to_string(),
            ..Default::default()
        },
        parent: Action {
            method: "PUT".to_string(),
            uri: "http://plans.local/P0/items/1".to_string(),
            payload: doc! { "seats": 2, "note": "window" },
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_then_find_returns_same_record() {
    let repo = repository();

    let created = repo.create("P1", draft("reserve")).await.unwrap();
    assert!(ObjectId::parse_str(&created.id).is_ok());
    assert_eq!(created.plan_id, "P1");

    let found = repo.find_one("P1", &created.id).await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_create_forces_plan_from_path() {
    let repo = repository();
    let mut input = draft("reserve");
    input.plan_id = "someone-else".to_string();

    let created = repo.create("P1", input).await.unwrap();

    assert_eq!(created.plan_id, "P1");
    assert!(repo.find_all_by_plan("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_plan_cannot_see_record() {
    let repo = repository();
    let created = repo.create("P1", draft("reserve")).await.unwrap();

    let err = repo.find_one("P2", &created.id).await.unwrap_err();
    assert!(err.is_not_found());

    let err = repo.delete_one("P2", &created.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.find_one("P1", &created.id).await.is_ok());
}

#[tokio::test]
async fn test_malformed_identifier_is_not_found() {
    let repo = repository();
    let err = repo.find_one("P1", "not-an-object-id").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_returns_only_plan_records_in_insertion_order() {
    let repo = repository();
    let first = repo.create("P1", draft("first")).await.unwrap();
    repo.create("P2", draft("elsewhere")).await.unwrap();
    let second = repo.create("P1", draft("second")).await.unwrap();

    let listed = repo.find_all_by_plan("P1").await.unwrap();
    assert_eq!(listed, vec![first, second]);
}

#[tokio::test]
async fn test_update_title_only_keeps_actions() {
    let repo = repository();
    let created = repo.create("P1", draft("reserve")).await.unwrap();

    let patch = EventCallback {
        title: "reserve window seat".to_string(),
        ..Default::default()
    };
    let updated = repo.update("P1", &created.id, patch).await.unwrap();

    assert_eq!(updated.title, "reserve window seat");
    assert_eq!(updated.undo, created.undo);
    assert_eq!(updated.parent, created.parent);
    assert_eq!(repo.find_one("P1", &created.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_update_cannot_move_record_to_other_plan() {
    let repo = repository();
    let created = repo.create("P1", draft("reserve")).await.unwrap();

    let patch = EventCallback {
        id: ObjectId::new().to_hex(),
        plan_id: "P2".to_string(),
        ..Default::default()
    };
    let updated = repo.update("P1", &created.id, patch).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.plan_id, "P1");
    assert!(repo.find_all_by_plan("P2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_payload_merges_by_key() {
    let repo = repository();
    let created = repo.create("P1", draft("reserve")).await.unwrap();

    let patch = EventCallback {
        parent: Action {
            payload: doc! { "seats": 3 },
            ..Default::default()
        },
        ..Default::default()
    };
    let updated = repo.update("P1", &created.id, patch).await.unwrap();

    assert_eq!(updated.parent.payload, doc! { "seats": 3, "note": "window" });
    assert_eq!(updated.parent.method, "PUT");
}

#[tokio::test]
async fn test_update_missing_record_surfaces_not_found() {
    let repo = repository();
    let err = repo
        .update("P1", &ObjectId::new().to_hex(), draft("ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_twice_reports_not_found() {
    let repo = repository();
    let created = repo.create("P1", draft("reserve")).await.unwrap();

    repo.delete_one("P1", &created.id).await.unwrap();

    let err = repo.delete_one("P1", &created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_all_on_empty_plan_succeeds() {
    let repo = repository();
    repo.create("P1", draft("a")).await.unwrap();
    repo.create("P1", draft("b")).await.unwrap();
    repo.create("P2", draft("c")).await.unwrap();

    assert_eq!(repo.delete_all_by_plan("P1").await.unwrap(), 2);
    assert_eq!(repo.delete_all_by_plan("P1").await.unwrap(), 0);
    assert_eq!(repo.delete_all_by_plan("never-used").await.unwrap(), 0);

    assert!(repo.find_all_by_plan("P1").await.unwrap().is_empty());
    assert_eq!(repo.find_all_by_plan("P2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_undecodable_documents_are_skipped_when_listing() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let repo = repository_over(store.clone(), Duration::from_secs(5));
    repo.create("P1", draft("good")).await.unwrap();
    store
        .insert_one("event_callback", doc! { "planid": "P1", "title": 42 })
        .await
        .unwrap();

    let listed = repo.find_all_by_plan("P1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "good");
}

/// 每次操作前等待固定时长的存储
struct SlowStore {
    inner: InMemoryDocumentStore,
    delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowStore {
    fn backend(&self) -> &'static str {
        "slow"
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_one(collection, filter).await
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find(collection, filter).await
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert_one(collection, document).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.replace_one(collection, filter, replacement).await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_one(collection, filter).await
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_many(collection, filter).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.ping().await
    }

    async fn drop_database(&self) -> Result<(), StoreError> {
        self.inner.drop_database().await
    }
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = Arc::new(SlowStore {
        inner: InMemoryDocumentStore::new(),
        delay: Duration::from_millis(500),
    });
    let repo = repository_over(store, Duration::from_millis(50));

    let err = repo.create("P1", draft("reserve")).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout { operation: "insert_one", .. }), "{err}");

    let err = repo.find_all_by_plan("P1").await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout { .. }), "{err}");

    let err = repo.find_one("P1", &ObjectId::new().to_hex()).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout { .. }), "{err}");
}

/// 前 `gated` 次 find_one 读完后在屏障处汇合，让两个更新读到同一份旧数据
struct GatedStore {
    inner: InMemoryDocumentStore,
    barrier: Barrier,
    gated: AtomicI64,
}

#[async_trait]
impl DocumentStore for GatedStore {
    fn backend(&self) -> &'static str {
        "gated"
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        let found = self.inner.find_one(collection, filter).await;
        if self.gated.fetch_sub(1, Ordering::SeqCst) > 0 {
            self.barrier.wait().await;
        }
        found
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, filter).await
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError> {
        self.inner.insert_one(collection, document).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<u64, StoreError> {
        self.inner.replace_one(collection, filter, replacement).await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        self.inner.delete_one(collection, filter).await
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        self.inner.delete_many(collection, filter).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn drop_database(&self) -> Result<(), StoreError> {
        self.inner.drop_database().await
    }
}

// 读取-合并-替换不是原子的：两个并发更新读到同一份数据时，后写入者覆盖前者
#[tokio::test]
async fn test_concurrent_updates_lose_one_patch() {
    let store = Arc::new(GatedStore {
        inner: InMemoryDocumentStore::new(),
        barrier: Barrier::new(2),
        gated: AtomicI64::new(0),
    });
    let repo = Arc::new(repository_over(store.clone(), Duration::from_secs(5)));
    let created = repo.create("P1", draft("reserve")).await.unwrap();
    store.gated.store(2, Ordering::SeqCst);

    let retitle = EventCallback {
        title: "renamed".to_string(),
        ..Default::default()
    };
    let remethod = EventCallback {
        undo: Action {
            method: "POST".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let (left, right) = tokio::join!(
        repo.update("P1", &created.id, retitle),
        repo.update("P1", &created.id, remethod),
    );
    left.unwrap();
    right.unwrap();

    let stored = repo.find_one("P1", &created.id).await.unwrap();
    let title_kept = stored.title == "renamed";
    let method_kept = stored.undo.method == "POST";
    assert!(title_kept != method_kept, "exactly one patch survives: {stored:?}");
}
