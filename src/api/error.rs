//! HTTP error mapping
//!
//! Converts tracker errors into status codes and JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ExpenseError;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Expense(#[from] ExpenseError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Expense(err) => match err {
                ExpenseError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                ExpenseError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "invalid_credentials")
                }
                ExpenseError::NotLoggedIn { .. } => (StatusCode::UNAUTHORIZED, "not_logged_in"),
                ExpenseError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
                ExpenseError::AlreadyLoggedIn { .. } => {
                    (StatusCode::CONFLICT, "already_logged_in")
                }
                ExpenseError::Config(_)
                | ExpenseError::Io(_)
                | ExpenseError::Json(_)
                | ExpenseError::Storage(_)
                | ExpenseError::Corrupt { .. }
                | ExpenseError::PasswordHash(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
