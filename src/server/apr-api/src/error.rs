//! API error responses.

use apr_auth::{AuthError, SigningError};
use apr_storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Errors returned by handlers and the auth middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or parameters are invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failed. Holds the client-facing message only.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Something failed on our side. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Unauthorized(e.client_message())
    }
}

impl From<SigningError> for ApiError {
    fn from(e: SigningError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            },
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
