use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

use super::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "profile": state.registry.profile_name(),
            "sections": state.registry.sections().len(),
            "UTC_time": chrono::Utc::now().to_rfc2822(),
        })),
    )
}
