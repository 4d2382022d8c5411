use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check, including the article store.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state
        .store()
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("store health check failed: {e}")))?;

    let storage = if state.config().database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };
    Ok(Json(json!({
        "status": "ok",
        "storage": storage,
        "subscribers": state.event_bus().subscriber_count(),
    })))
}

/// Lightweight ping, no storage check.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
