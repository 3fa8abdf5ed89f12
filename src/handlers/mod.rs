// src/handlers/mod.rs

pub mod auth;
pub mod categories;
pub mod posts;

use axum::response::IntoResponse;
use serde_json::json;

use crate::response::ApiResponse;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    ApiResponse::ok(json!({ "status": "ok" }))
}
