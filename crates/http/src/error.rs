//! Error handling for the Lectern HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses
///
/// Every expected failure travels through one of these variants so that the
/// status code and response body are decided in exactly one place.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Create a validation error (HTTP 400)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error (HTTP 404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error (HTTP 409)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        let (status, message) = match self {
            ApiError::Validation { message } => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict { message } => (StatusCode::CONFLICT, message),
            ApiError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        tracing::error!(
            error_id = %error_id,
            status_code = %status.as_u16(),
            "Request error"
        );

        // In production, we might want to hide internal error details
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        // Error contract: `status` in the body always matches the HTTP code.
        let error_response = json!({
            "error": {
                "message": message,
                "status": status.as_u16(),
            }
        });

        (status, Json(error_response)).into_response()
    }
}
