use crate::server::error::ApiError;
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fabgate_core::TransactionDescriptor;
use serde::de::IgnoredAny;
use serde::Deserialize;
use slog::{info, warn};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub identity: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    pub identity: String,
    pub fcn: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn rejected(rejection: JsonRejection) -> ApiError {
    ApiError::invalid_input(rejection.body_text())
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn enroll_admin(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.lifecycle.enroll_admin().await.map_err(|err| {
        warn!(state.log, "Admin enrollment failed: {}", err);
        ApiError::from(err)
    })?;
    info!(state.log, "Enrolled admin '{}'", state.lifecycle.admin_label());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    request: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request.map_err(rejected)?;
    state
        .lifecycle
        .register_user(&request.identity)
        .await
        .map_err(|err| {
            warn!(state.log, "Registration of '{}' failed: {}", request.identity, err);
            ApiError::from(err)
        })?;
    info!(state.log, "Registered user '{}'", request.identity);
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the evaluation result exactly as the contract produced it, labelled as JSON when
/// it parses as JSON.
pub async fn query(
    State(state): State<Arc<AppState>>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(rejected)?;
    let transaction = TransactionDescriptor {
        identity: request.identity,
        function: request.fcn,
        args: request.args,
    };
    let payload = state.session.query(&transaction).await.map_err(|err| {
        warn!(state.log, "Query '{}' failed: {}", transaction.function, err);
        ApiError::from(err)
    })?;

    let content_type = if serde_json::from_slice::<IgnoredAny>(&payload).is_ok() {
        "application/json"
    } else {
        "application/octet-stream"
    };
    Ok(([(CONTENT_TYPE, content_type)], payload).into_response())
}
