//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how each
//! error is presented to HTTP clients.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stackit_core::{ForumError, PortError};
use tracing::error;

use crate::config::ConfigError;
use crate::web::protocol::ErrorResponse;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A forum operation was rejected or failed.
    #[error(transparent)]
    Forum(#[from] ForumError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials were missing, unknown or expired.
    #[error("{0}")]
    Unauthorized(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Forum(err.into())
    }
}

/// Request bodies that are not valid JSON for the endpoint are validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Forum(ForumError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    /// The text sent to the client. Forum errors carry their detail bare, without
    /// the category prefix used in logs.
    fn client_message(&self) -> String {
        match self {
            ApiError::Forum(
                ForumError::NotFound(detail)
                | ForumError::AuthorizationDenied(detail)
                | ForumError::Validation(detail)
                | ForumError::Conflict(detail)
                | ForumError::WriteContention(detail),
            ) => detail.clone(),
            _ => self.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forum(err) => match err {
                ForumError::NotFound(_) => StatusCode::NOT_FOUND,
                ForumError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                ForumError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
                ForumError::Validation(_) => StatusCode::BAD_REQUEST,
                ForumError::Conflict(_) | ForumError::WriteContention(_) => StatusCode::CONFLICT,
                ForumError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures are logged in full but never echoed to the client.
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.client_message()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
