use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::lifecycle::LifecycleError;
use crate::media::MediaError;
use crate::store::StoreError;
use crate::validation::FieldErrors;

/// Envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `BAD_REQUEST`,
    /// `INVALID_PARAMETER`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `PAYLOAD_TOO_LARGE`, `STORAGE_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "The given data was invalid.")]
    pub message: String,
    /// Field name to violation messages, present for `VALIDATION_ERROR`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>, example = json!({"name": ["The name field is required."]}))]
    pub data: Option<FieldErrors>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(FieldErrors),
    /// Body could not be read as JSON or multipart.
    BadRequest(String),
    InvalidParameter(String),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    PayloadTooLarge,
    Storage(String),
    Internal(String),
}

fn body(code: &'static str, message: impl Into<String>) -> ErrorBody {
    ErrorBody {
        success: false,
        code,
        message: message.into(),
        data: None,
    }
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    data: Some(errors),
                    ..body("VALIDATION_ERROR", "The given data was invalid.")
                },
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, body("BAD_REQUEST", msg)),
            AppError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, body("INVALID_PARAMETER", msg))
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                body("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg)),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                body("PAYLOAD_TOO_LARGE", "Request body is too large"),
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("STORAGE_ERROR", "A file storage operation failed"),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(errors) => AppError::Validation(errors),
            LifecycleError::NotFound { label, id } => {
                AppError::NotFound(format!("{label} {id} not found"))
            }
            LifecycleError::InvalidParameter(msg) => AppError::InvalidParameter(msg),
            LifecycleError::Storage(detail) => AppError::Storage(detail),
            LifecycleError::Hashing(detail) => AppError::Internal(detail),
            LifecycleError::Store(err) => err.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::Storage(err.to_string())
    }
}
