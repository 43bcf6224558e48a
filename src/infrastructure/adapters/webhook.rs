//! # WebHook 回放适配器
//!
//! 把事件回调的 `parent` 动作转换成一次 HTTP 请求并判定结果。
//!
//! - 每次调用使用新的连接（关闭连接池复用），不做自动重试
//! - 状态码 `>= 300` 视为远端拒绝，尽量读取响应体放入错误
//! - 超过截止时间视为传输失败

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use tracing::{error, info, warn};

use crate::domain::{CallbackDispatcher, EventCallback};
use crate::error::DispatchError;

/// 默认回放截止时间
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// WebHook 回放器
pub struct WebhookDispatcher {
    client: Client,
    default_deadline: Duration,
}

impl WebhookDispatcher {
    /// 创建回放器
    pub fn new(default_deadline: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .context("failed to build webhook http client")?;

        Ok(Self {
            client,
            default_deadline,
        })
    }

    fn build_request(
        &self,
        callback: &EventCallback,
        body: Vec<u8>,
        deadline: Duration,
    ) -> Result<reqwest::Request, DispatchError> {
        let parent = &callback.parent;

        let method = Method::from_bytes(parent.method.as_bytes()).map_err(|err| {
            DispatchError::RequestConstruction(format!("invalid method {:?}: {err}", parent.method))
        })?;
        let url = Url::parse(&parent.uri).map_err(|err| {
            DispatchError::RequestConstruction(format!("invalid uri {:?}: {err}", parent.uri))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DispatchError::RequestConstruction(format!(
                "unsupported scheme in {:?}",
                parent.uri
            )));
        }

        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(deadline)
            .build()
            .map_err(|err| DispatchError::RequestConstruction(err.to_string()))
    }
}

#[async_trait]
impl CallbackDispatcher for WebhookDispatcher {
    fn default_deadline(&self) -> Duration {
        self.default_deadline
    }

    async fn apply(
        &self,
        callback: &EventCallback,
        deadline: Duration,
    ) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(&callback.parent.payload).inspect_err(|err| {
            error!(
                id = %callback.id,
                plan_id = %callback.plan_id,
                error = %err,
                "error occurred during JSON payload creation"
            );
        })?;

        let request = self
            .build_request(callback, body, deadline)
            .inspect_err(|err| {
                warn!(
                    id = %callback.id,
                    plan_id = %callback.plan_id,
                    error = %err,
                    "error while constructing publishing request"
                );
            })?;

        let response = self.client.execute(request).await.map_err(|err| {
            let reason = if err.is_timeout() {
                format!("deadline of {deadline:?} exceeded: {err}")
            } else {
                err.to_string()
            };
            warn!(
                id = %callback.id,
                plan_id = %callback.plan_id,
                uri = %callback.parent.uri,
                error = %reason,
                "error while publishing"
            );
            DispatchError::Transport(reason)
        })?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => format!("<unreadable body: {err}>"),
            };
            error!(
                id = %callback.id,
                plan_id = %callback.plan_id,
                status = %status,
                body = %body,
                "error when applying event to plan"
            );
            return Err(DispatchError::RemoteRejection {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            id = %callback.id,
            plan_id = %callback.plan_id,
            status = %status,
            "event applied to parent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;

    fn with_parent(method: &str, uri: &str) -> EventCallback {
        EventCallback {
            parent: Action {
                method: method.to_string(),
                uri: uri.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_build_request_sets_json_content_type() {
        let dispatcher = WebhookDispatcher::new(DEFAULT_DEADLINE).unwrap();
        let request = dispatcher
            .build_request(
                &with_parent("PATCH", "http://localhost:9/plans/P1"),
                b"{}".to_vec(),
                Duration::from_secs(1),
            )
            .unwrap();

        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(request.url().path(), "/plans/P1");
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(request.timeout(), Some(&Duration::from_secs(1)));
    }

    #[test]
    fn test_build_request_rejects_malformed_target() {
        let dispatcher = WebhookDispatcher::new(DEFAULT_DEADLINE).unwrap();
        for (method, uri) in [
            ("PUT", "not a uri"),
            ("PUT", "ftp://localhost/file"),
            ("", "http://localhost/"),
            ("BAD METHOD", "http://localhost/"),
        ] {
            let err = dispatcher
                .build_request(&with_parent(method, uri), Vec::new(), DEFAULT_DEADLINE)
                .unwrap_err();
            assert!(
                matches!(err, DispatchError::RequestConstruction(_)),
                "{method} {uri}: {err}"
            );
        }
    }
}
