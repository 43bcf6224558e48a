//! Esther 错误模块
//!
//! - `StoreError`：文档存储网关与仓储层的错误分类
//! - `DispatchError`：WebHook 回放（Apply）的错误分类
//!
//! 所有错误都是单次调用可恢复的条件，不会导致进程退出。

use std::time::Duration;

use thiserror::Error;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 没有匹配 (id, owner) 的记录
    #[error("{collection} {id} not found in plan {owner}")]
    NotFound {
        collection: &'static str,
        id: String,
        owner: String,
    },

    /// id 不是合法的 ObjectId 字符串
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// 写入失败或连接失败
    #[error("persistence error: {0}")]
    Persistence(String),

    /// 操作超过了固定的超时时间
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// 原始文档无法还原为实体
    #[error("cannot decode {collection}: {reason}")]
    Decode {
        collection: &'static str,
        reason: String,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

/// WebHook 回放错误
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("cannot serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot build request: {0}")]
    RequestConstruction(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote rejected the request with status {status}: {body}")]
    RemoteRejection { status: u16, body: String },
}

impl DispatchError {
    /// 远端返回的 HTTP 状态码（仅 RemoteRejection 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::RemoteRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 回放单条回调时的错误：先读取，再发送
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
