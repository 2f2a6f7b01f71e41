//! HTTP request handlers. Each one extracts its inputs, calls the
//! `ArenaService` and serializes the result; engine errors become `ApiError`s.
pub mod battle;
pub mod comments;
pub mod events;
pub mod memes;
pub mod profile;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
