//! 文档存储后端抽象

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::bson::oid::ObjectId;

use crate::error::StoreError;

/// 进程级共享的存储连接句柄
pub type DocumentStoreRef = Arc<dyn DocumentStore>;

/// 文档数据库的最小操作集，过滤条件均为字段相等匹配
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 后端名称，用于日志
    fn backend(&self) -> &'static str;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, StoreError>;

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError>;

    /// 插入并返回存储分配的 id
    async fn insert_one(&self, collection: &str, document: Document)
    -> Result<ObjectId, StoreError>;

    /// 返回匹配到的文档数量
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<u64, StoreError>;

    /// 返回删除的文档数量
    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError>;

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn drop_database(&self) -> Result<(), StoreError>;
}
