use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model call failed: {0}")]
    ModelCallFailed(String),

    #[error("Response parse failed: {0}")]
    ResponseParseFailed(String),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ModelCallFailed(cause) => AppError::ModelCallFailed(cause.to_string()),
            LlmError::ResponseParseFailed(reason) => AppError::ResponseParseFailed(reason),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ModelCallFailed(msg) => {
                tracing::error!("Model call failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MODEL_CALL_FAILED",
                    "The AI provider could not be reached. Please try again later.".to_string(),
                )
            }
            AppError::ResponseParseFailed(msg) => {
                tracing::error!("Response parse failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RESPONSE_PARSE_FAILED",
                    "The AI provider returned an unreadable response".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
