//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::repository::RepositoryError;
use crate::models::draft::ValidationError;
use crate::services::conflicts::ConflictError;
use crate::services::routines::RoutineError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Always false; mirrors the `success` flag of successful responses
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// The detected double booking, for `CONFLICT` errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictError>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            details: None,
            conflict: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Malformed request that never reached validation
    BadRequest(String),
    /// Request body over the configured limit
    PayloadTooLarge(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
    /// Submitted routine failed validation
    Validation(ValidationError),
    /// Submitted routine would double-book a teacher
    Conflict(ConflictError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiError::new("PAYLOAD_TOO_LARGE", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
            }
            AppError::Repository(e) => {
                log::error!("Repository failure: {}", e);
                let status = if e.is_retryable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, ApiError::new("REPOSITORY_ERROR", e.to_string()))
            }
            AppError::Validation(e) => {
                let details = serde_json::to_value(&e.issues).unwrap_or(Value::Null);
                (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("VALIDATION_ERROR", e.to_string()).with_details(details),
                )
            }
            AppError::Conflict(conflict) => {
                let mut error = ApiError::new("CONFLICT", conflict.to_string());
                error.conflict = Some(conflict);
                (StatusCode::BAD_REQUEST, error)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<RoutineError> for AppError {
    fn from(err: RoutineError) -> Self {
        match err {
            RoutineError::Validation(e) => AppError::Validation(e),
            RoutineError::Conflict(e) => AppError::Conflict(e),
            RoutineError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
