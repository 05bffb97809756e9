use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::structured::{ErrorKind, ErrorRecord};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Agent error: {0}")]
    Agent(#[from] ErrorRecord),

    #[error("CV extraction error: {0}")]
    CvExtraction(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, raw) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Agent(record) => {
                tracing::error!("Agent error ({}): {}", record.kind.as_str(), record.message);
                let code = match record.kind {
                    ErrorKind::Transport => "LLM_UPSTREAM_ERROR",
                    ErrorKind::Decode => "LLM_OUTPUT_UNPARSEABLE",
                    ErrorKind::Validation => "LLM_OUTPUT_INVALID",
                };
                // The raw buffer goes back to the caller so the UI can show
                // what the model actually produced.
                (
                    StatusCode::BAD_GATEWAY,
                    code,
                    record.message.clone(),
                    Some(record.raw_buffer.clone()),
                )
            }
            AppError::CvExtraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CV_EXTRACTION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "raw_content": raw,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_maps_to_bad_gateway() {
        for kind in [ErrorKind::Transport, ErrorKind::Decode, ErrorKind::Validation] {
            let record = ErrorRecord {
                kind,
                message: "m".to_string(),
                raw_buffer: "raw".to_string(),
            };
            let response = AppError::Agent(record).into_response();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn test_not_found_and_validation_statuses() {
        let response = AppError::NotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::Validation("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
