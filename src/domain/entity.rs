//! 实体能力契约
//!
//! 文档网关只通过这里暴露的能力访问记录，不关心具体字段。

use mongodb::bson::{self, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// 可被文档网关持久化的记录
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 记录自身的 id，新记录为空
    fn identifier(&self) -> &str;

    /// 返回一个替换了 id 的新值，不修改 `self`
    fn with_reset_identifier(&self, id: &str) -> Self;

    /// 分区键（计划 id）
    fn owner_key(&self) -> &str;

    /// 存放该类型的集合名
    fn collection_name() -> &'static str;

    /// 文档中保存分区键的字段名
    fn owner_field() -> &'static str;

    /// 从一条原始文档还原出完整的记录
    fn decode_from(raw: Document) -> Result<Self, StoreError> {
        bson::from_document(raw).map_err(|err| StoreError::Decode {
            collection: Self::collection_name(),
            reason: err.to_string(),
        })
    }
}
