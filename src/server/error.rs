//! HTTP 에러 응답

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chat::ChatError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Chat(e) if e.is_user_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Chat(ChatError::SessionNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Session not found: {}", id))
            }
            ApiError::Chat(e) => {
                tracing::error!("Chat error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
