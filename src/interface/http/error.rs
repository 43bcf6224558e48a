use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::error::{ApplyError, DispatchError, StoreError};

/// HTTP 错误，响应体为 `{"error": {"title", "detail"}}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{title}: {detail}")]
    BadRequest { title: String, detail: String },

    #[error("{title}: {detail}")]
    NotFound { title: String, detail: String },

    #[error("Unauthorized IP: {0}")]
    Unauthorized(String),

    #[error("{title}: {detail}")]
    BadGateway { title: String, detail: String },

    #[error("{title}: {detail}")]
    GatewayTimeout { title: String, detail: String },
}

impl ApiError {
    pub fn bad_request(title: &str, detail: impl ToString) -> Self {
        ApiError::BadRequest {
            title: title.to_string(),
            detail: detail.to_string(),
        }
    }

    /// 存储错误映射：不存在 → 404，超时 → 504，其余 → 400
    pub fn from_store(title: &str, err: StoreError) -> Self {
        let title = title.to_string();
        let detail = err.to_string();
        match err {
            StoreError::NotFound { .. } | StoreError::InvalidIdentifier(_) => {
                ApiError::NotFound { title, detail }
            }
            StoreError::Timeout { .. } => ApiError::GatewayTimeout { title, detail },
            StoreError::Persistence(_) | StoreError::Decode { .. } => {
                ApiError::BadRequest { title, detail }
            }
        }
    }

    pub fn from_dispatch(title: &str, err: DispatchError) -> Self {
        ApiError::BadGateway {
            title: title.to_string(),
            detail: err.to_string(),
        }
    }

    pub fn from_apply(title: &str, err: ApplyError) -> Self {
        match err {
            ApplyError::Store(err) => Self::from_store(title, err),
            ApplyError::Dispatch(err) => Self::from_dispatch(title, err),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, detail) = match self {
            ApiError::BadRequest { title, detail }
            | ApiError::NotFound { title, detail }
            | ApiError::BadGateway { title, detail }
            | ApiError::GatewayTimeout { title, detail } => (title, detail),
            ApiError::Unauthorized(detail) => ("Unauthorized IP".to_string(), detail),
        };

        let body = Json(json!({
            "error": {
                "title": title,
                "detail": detail,
            }
        }));

        (status, body).into_response()
    }
}
