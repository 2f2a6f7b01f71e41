use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meme_arena_engine::ArenaError;
use serde::Serialize;
use tracing::error;

/// An engine error on its way to an HTTP client.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ArenaError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ArenaError::NotFound(_) => StatusCode::NOT_FOUND,
            ArenaError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ArenaError::Forbidden(_) => StatusCode::FORBIDDEN,
            ArenaError::Conflict(_) | ArenaError::NotEnoughContenders => StatusCode::CONFLICT,
            ArenaError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ArenaError::StorageExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
            ArenaError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            "internal storage error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
