//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::conversation::ConversationError;
use crate::pipeline::extraction::{CapabilityError, ExtractionError};

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Upload exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Document cannot be read: {0}")]
    UnreadableDocument(String),
    #[error("Model output rejected: {0}")]
    ModelOutputInvalid(String),
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::UnsupportedMediaType(media_type) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                format!("'{media_type}' is not supported; upload an image or a PDF"),
            ),
            ApiError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Upload exceeds the {limit} byte limit"),
            ),
            ApiError::UnreadableDocument(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DOCUMENT_UNREADABLE",
                detail.clone(),
            ),
            ApiError::ModelOutputInvalid(detail) => (
                StatusCode::BAD_GATEWAY,
                "MODEL_OUTPUT_INVALID",
                detail.clone(),
            ),
            ApiError::ModelUnavailable(detail) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_UNAVAILABLE",
                detail.clone(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedMediaType(media_type) => ApiError::UnsupportedMediaType(media_type),
            ExtractionError::MalformedCandidateSchema(detail) => ApiError::ModelOutputInvalid(detail),
            // Retrying the same upload cannot help, so this is not a 503.
            ExtractionError::CapabilityTransport(CapabilityError::Document(detail)) => {
                ApiError::UnreadableDocument(detail)
            }
            ExtractionError::CapabilityTransport(fault) => ApiError::ModelUnavailable(fault.to_string()),
        }
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::EmptyMessage => ApiError::BadRequest("Message content is empty".into()),
            ConversationError::Capability(fault) => ApiError::ModelUnavailable(fault.to_string()),
        }
    }
}
