/// Unified error types for the photo journal
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the journal
#[derive(Error, Debug)]
pub enum JournalError {
    /// Unknown photo id (or other missing resource)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client supplied something unusable (missing file, bad date, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body exceeded the configured upload limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Blob write/read/delete failures
    #[error("Blob storage error: {0}")]
    Storage(String),

    /// Metadata store failures that are not driver errors
    #[error("Metadata store error: {0}")]
    Metadata(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl JournalError {
    /// HTTP status and stable error code for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            JournalError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            JournalError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "InvalidInput"),
            JournalError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge"),
            JournalError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StorageFailure"),
            JournalError::Metadata(_) | JournalError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MetadataFailure")
            }
            JournalError::Config(_) | JournalError::Io(_) | JournalError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        }
    }
}

/// Convert JournalError to HTTP response
impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = error_code, "request failed");
            crate::metrics::record_error(error_code);
            // Don't leak details
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, code = error_code, "request rejected");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for journal operations
pub type JournalResult<T> = Result<T, JournalError>;
