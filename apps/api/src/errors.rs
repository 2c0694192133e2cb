use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";
const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze CV. Please try again later.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Client-caused faults carry an actionable message; server faults are logged
/// and answered with a generic one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid or expired API key")]
    InvalidCredential,

    #[error("Payload exceeds {limit_mb}MB")]
    PayloadTooLarge { limit_mb: usize },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidCredential => AppError::InvalidCredential,
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat(msg) => AppError::Validation(msg),
            ExtractionError::Failed(detail) => AppError::Extraction(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => {
                tracing::info!("Rejected request: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Extraction(detail) => {
                tracing::warn!("Text extraction failed: {detail}");
                (
                    StatusCode::BAD_REQUEST,
                    "Could not extract text from file".to_string(),
                )
            }
            AppError::InvalidCredential => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired API key".to_string(),
            ),
            AppError::PayloadTooLarge { limit_mb } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File size exceeds {limit_mb}MB limit"),
            ),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ANALYSIS_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let validation = AppError::Validation("API key is required".into()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let extraction = AppError::Extraction("bad xref table".into()).into_response();
        assert_eq!(extraction.status(), StatusCode::BAD_REQUEST);

        let credential = AppError::InvalidCredential.into_response();
        assert_eq!(credential.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_errors_map_to_internal_error() {
        let llm = AppError::Llm("upstream 503".into()).into_response();
        assert_eq!(llm.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let internal = AppError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_payload_too_large_maps_to_413() {
        let resp = AppError::PayloadTooLarge { limit_mb: 10 }.into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_llm_credential_error_converts_to_invalid_credential() {
        let err: AppError = LlmError::InvalidCredential.into();
        assert!(matches!(err, AppError::InvalidCredential));

        let err: AppError = LlmError::EmptyResponse.into();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[test]
    fn test_unsupported_format_converts_to_validation() {
        let err: AppError = ExtractionError::UnsupportedFormat("nope".into()).into();
        assert!(matches!(err, AppError::Validation(msg) if msg == "nope"));
    }
}
