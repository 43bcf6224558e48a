//! HTTP 处理器：绑定请求，调用应用层，映射结果

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use super::dto::CallbackBody;
use super::error::ApiError;
use super::server::AppState;
use crate::application::{
    ApplyEventCallbackCommand, ApplyPlanCallbacksCommand, CreateEventCallbackCommand,
    DeleteEventCallbackCommand, DeletePlanCallbacksCommand, GetEventCallbackQuery,
    ListEventCallbacksQuery, UpdateEventCallbackCommand,
};

const BIND_ERROR_TITLE: &str = "The callback input payload could not be bound";

/// 回放参数：`?timeoutMs=` 覆盖默认截止时间
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyParams {
    pub timeout_ms: Option<u64>,
}

impl ApplyParams {
    fn deadline(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn bind(
    payload: Result<Json<CallbackBody>, JsonRejection>,
) -> Result<crate::domain::EventCallback, ApiError> {
    let Json(body) =
        payload.map_err(|rejection| ApiError::bad_request(BIND_ERROR_TITLE, rejection.body_text()))?;
    body.into_domain()
        .map_err(|detail| ApiError::bad_request(BIND_ERROR_TITLE, detail))
}

pub async fn health_check() -> Json<Value> {
    Json(Value::Null)
}

pub async fn ready_check(State(state): State<AppState>) -> Response {
    match state.gateway.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!("OK"))).into_response(),
        Err(err) => {
            error!(error = %err, "readiness check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "errors": {
                        "persistence": [format!("Not connected to the database: {err}")]
                    }
                })),
            )
                .into_response()
        }
    }
}

pub async fn reset(State(state): State<AppState>) -> Response {
    info!("reset");
    let result = state.gateway.drop_database().await;
    info!("end of reset");

    match result {
        Ok(()) => (StatusCode::OK, Json(json!("OK"))).into_response(),
        Err(err) => {
            error!(error = %err, "the reset has failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": [err.to_string()] })),
            )
                .into_response()
        }
    }
}

pub async fn list_callbacks(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<Vec<CallbackBody>>, ApiError> {
    let callbacks = state
        .query_handler
        .handle_list(ListEventCallbacksQuery { plan_id })
        .await
        .map_err(|err| ApiError::from_store("The callbacks could not be listed", err))?;

    Ok(Json(callbacks.into_iter().map(CallbackBody::from).collect()))
}

pub async fn get_callback(
    State(state): State<AppState>,
    Path((plan_id, event_id)): Path<(String, String)>,
) -> Result<Json<CallbackBody>, ApiError> {
    let callback = state
        .query_handler
        .handle_get(GetEventCallbackQuery { plan_id, event_id })
        .await
        .map_err(|err| ApiError::from_store("The callback could not be found", err))?;

    Ok(Json(callback.into()))
}

pub async fn create_callback(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    payload: Result<Json<CallbackBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CallbackBody>), ApiError> {
    let callback = bind(payload)?;

    let created = state
        .command_handler
        .handle_create(CreateEventCallbackCommand { plan_id, callback })
        .await
        .map_err(|err| ApiError::from_store("The callback could not be created", err))?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_callback(
    State(state): State<AppState>,
    Path((plan_id, event_id)): Path<(String, String)>,
    payload: Result<Json<CallbackBody>, JsonRejection>,
) -> Result<Json<CallbackBody>, ApiError> {
    let patch = bind(payload)?;

    let updated = state
        .command_handler
        .handle_update(UpdateEventCallbackCommand {
            plan_id,
            event_id,
            patch,
        })
        .await
        .map_err(|err| ApiError::from_store("The callback could not be updated", err))?;

    Ok(Json(updated.into()))
}

pub async fn delete_callback(
    State(state): State<AppState>,
    Path((plan_id, event_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .command_handler
        .handle_delete(DeleteEventCallbackCommand { plan_id, event_id })
        .await
        .map_err(|err| ApiError::from_store("The event callback could not be deleted", err))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_callbacks(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .command_handler
        .handle_delete_plan(DeletePlanCallbacksCommand { plan_id })
        .await
        .map_err(|err| ApiError::from_store("The events could not be deleted", err))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn apply_callback(
    State(state): State<AppState>,
    Path((plan_id, event_id)): Path<(String, String)>,
    Query(params): Query<ApplyParams>,
) -> Result<StatusCode, ApiError> {
    state
        .command_handler
        .handle_apply(ApplyEventCallbackCommand {
            plan_id,
            event_id,
            deadline: params.deadline(),
        })
        .await
        .map_err(|err| ApiError::from_apply("The callback could not be applied", err))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn apply_callbacks_to_parent(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Query(params): Query<ApplyParams>,
) -> Result<Response, ApiError> {
    let report = state
        .command_handler
        .handle_apply_plan(ApplyPlanCallbacksCommand {
            plan_id,
            deadline: params.deadline(),
        })
        .await
        .map_err(|err| ApiError::from_store("The callbacks could not be applied", err))?;

    let status = if report.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(report)).into_response())
}
