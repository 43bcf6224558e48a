//! 文档存储网关
//!
//! 对任意实现了 [`Entity`] 的记录提供统一的 CRUD 原语。
//! 每个单条操作都同时按 `(_id, owner)` 定位，绝不只按 id 定位。
//! 每次调用都有固定的超时时间，超时返回 [`StoreError::Timeout`]。

use std::future::Future;
use std::time::Duration;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use tracing::{error, info, warn};

use super::store::DocumentStoreRef;
use crate::domain::Entity;
use crate::error::StoreError;

/// 默认的单次操作超时
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DocumentGateway {
    store: DocumentStoreRef,
    timeout: Duration,
}

impl DocumentGateway {
    pub fn new(store: DocumentStoreRef, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 在超时范围内执行一次存储调用；超时后未完成的调用被直接丢弃
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: self.timeout,
            }),
        }
    }

    fn scope_filter<E: Entity>(id: ObjectId, owner_key: &str) -> Document {
        let mut filter = doc! { "_id": id };
        filter.insert(E::owner_field(), owner_key);
        filter
    }

    /// 序列化前先去掉 id，由存储负责分配或保留
    fn to_document<E: Entity>(record: &E) -> Result<Document, StoreError> {
        bson::to_document(&record.with_reset_identifier("")).map_err(|err| {
            error!(
                collection = E::collection_name(),
                error = %err,
                "cannot serialize entity"
            );
            StoreError::Persistence(err.to_string())
        })
    }

    fn parse_identifier<E: Entity>(record: &E) -> Result<ObjectId, StoreError> {
        ObjectId::parse_str(record.identifier()).map_err(|_| {
            error!(
                collection = E::collection_name(),
                id = record.identifier(),
                "identifier is not a valid ObjectId"
            );
            StoreError::InvalidIdentifier(record.identifier().to_string())
        })
    }

    /// 按 `(identifier, owner_key)` 查找唯一一条记录
    pub async fn find_one<E: Entity>(&self, template: &E) -> Result<E, StoreError> {
        let not_found = || StoreError::NotFound {
            collection: E::collection_name(),
            id: template.identifier().to_string(),
            owner: template.owner_key().to_string(),
        };

        let id = Self::parse_identifier(template).map_err(|_| not_found())?;
        let filter = Self::scope_filter::<E>(id, template.owner_key());

        let found = self
            .bounded(
                "find_one",
                self.store.find_one(E::collection_name(), filter),
            )
            .await;

        match found {
            Ok(Some(raw)) => E::decode_from(raw).inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    id = template.identifier(),
                    error = %err,
                    "cannot decode stored document"
                );
            }),
            Ok(None) => {
                info!(
                    collection = E::collection_name(),
                    id = template.identifier(),
                    plan_id = template.owner_key(),
                    "no matching document"
                );
                Err(not_found())
            }
            Err(err @ StoreError::Timeout { .. }) => {
                error!(collection = E::collection_name(), error = %err, "find_one timed out");
                Err(err)
            }
            Err(err) => {
                error!(
                    collection = E::collection_name(),
                    id = template.identifier(),
                    plan_id = template.owner_key(),
                    error = %err,
                    "find_one query failed"
                );
                Err(not_found())
            }
        }
    }

    /// 按分区键列出全部记录；无法解码的文档会被跳过
    pub async fn find_by_owner<E: Entity>(&self, owner_key: &str) -> Result<Vec<E>, StoreError> {
        let mut filter = Document::new();
        filter.insert(E::owner_field(), owner_key);

        let raw = self
            .bounded("find", self.store.find(E::collection_name(), filter))
            .await
            .inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    plan_id = owner_key,
                    error = %err,
                    "cannot list documents"
                );
            })?;

        let mut records = Vec::with_capacity(raw.len());
        for document in raw {
            match E::decode_from(document) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    collection = E::collection_name(),
                    plan_id = owner_key,
                    error = %err,
                    "skipping undecodable document"
                ),
            }
        }
        Ok(records)
    }

    /// 插入一条记录，返回存储分配的 id（十六进制字符串）
    pub async fn insert_one<E: Entity>(&self, record: &E) -> Result<String, StoreError> {
        let document = Self::to_document(record)?;

        let id = self
            .bounded(
                "insert_one",
                self.store.insert_one(E::collection_name(), document),
            )
            .await
            .inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    plan_id = record.owner_key(),
                    error = %err,
                    "cannot insert document"
                );
            })?;

        let id = id.to_hex();
        info!(
            collection = E::collection_name(),
            id = %id,
            plan_id = record.owner_key(),
            "entity persisted"
        );
        Ok(id)
    }

    /// 整体替换 `(identifier, owner_key)` 对应的文档；未匹配时返回 `false`
    pub async fn replace_one<E: Entity>(&self, record: &E) -> Result<bool, StoreError> {
        let id = Self::parse_identifier(record)?;
        let document = Self::to_document(record)?;
        let filter = Self::scope_filter::<E>(id, record.owner_key());

        let matched = self
            .bounded(
                "replace_one",
                self.store
                    .replace_one(E::collection_name(), filter, document),
            )
            .await
            .inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    id = record.identifier(),
                    plan_id = record.owner_key(),
                    error = %err,
                    "cannot replace document"
                );
            })?;

        if matched != 1 {
            warn!(
                collection = E::collection_name(),
                id = record.identifier(),
                plan_id = record.owner_key(),
                matched,
                "replace matched no document"
            );
            return Ok(false);
        }

        info!(
            collection = E::collection_name(),
            id = record.identifier(),
            plan_id = record.owner_key(),
            "entity persisted"
        );
        Ok(true)
    }

    /// 删除 `(identifier, owner_key)` 对应的文档；恰好删除一条才返回 `true`
    pub async fn delete_one<E: Entity>(&self, template: &E) -> Result<bool, StoreError> {
        let id = Self::parse_identifier(template)?;
        let filter = Self::scope_filter::<E>(id, template.owner_key());

        let deleted = self
            .bounded(
                "delete_one",
                self.store.delete_one(E::collection_name(), filter),
            )
            .await
            .inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    id = template.identifier(),
                    plan_id = template.owner_key(),
                    error = %err,
                    "cannot delete document"
                );
            })?;

        Ok(deleted == 1)
    }

    /// 删除分区键下的全部文档；零条匹配不是错误
    pub async fn delete_many<E: Entity>(&self, owner_key: &str) -> Result<u64, StoreError> {
        let mut filter = Document::new();
        filter.insert(E::owner_field(), owner_key);

        let deleted = self
            .bounded(
                "delete_many",
                self.store.delete_many(E::collection_name(), filter),
            )
            .await
            .inspect_err(|err| {
                error!(
                    collection = E::collection_name(),
                    plan_id = owner_key,
                    error = %err,
                    "cannot delete documents"
                );
            })?;

        info!(
            collection = E::collection_name(),
            plan_id = owner_key,
            deleted,
            "documents deleted"
        );
        Ok(deleted)
    }

    /// 连通性检查
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", self.store.ping()).await
    }

    /// 清空整个数据库（仅本地管理命令使用）
    pub async fn drop_database(&self) -> Result<(), StoreError> {
        self.bounded("drop_database", self.store.drop_database())
            .await?;
        info!(backend = self.store.backend(), "the database has been reset");
        Ok(())
    }
}
