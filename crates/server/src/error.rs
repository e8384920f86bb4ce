//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Every error body is JSON with an `error` field. Server errors add a
//! generic `message`; rejected carts add `details`.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::{IntakeError, ItemRejection};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Database operation failed while performing a named action.
    #[error("{action}: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// Order intake failed.
    #[error("Order error: {0}")]
    Intake(#[from] IntakeError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(&'static str),

    /// No valid admin credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not an admin.
    #[error("Admin access required")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body was not valid JSON for the endpoint.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a repository error with the action that failed, for use with
    /// `map_err`.
    pub fn failed(action: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| Self::Failed { action, source }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Failed { .. }
                | Self::Internal(_)
                | Self::Intake(IntakeError::Repository(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ItemRejection>>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }

    fn server(error: impl Into<String>) -> Self {
        Self {
            message: Some("Internal server error".to_string()),
            ..Self::new(error)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match self {
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::server("Internal server error"),
            ),
            Self::Failed { action, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::server(action))
            }
            Self::Intake(err) => match err {
                IntakeError::EmptyOrder => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new("No items in order"))
                }
                IntakeError::InvalidOrderItems(details) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        details: Some(details),
                        ..ErrorBody::new("Invalid order items")
                    },
                ),
                IntakeError::Repository(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Failed to create order"),
                ),
            },
            Self::Auth(err) => match err {
                AuthError::MissingCredentials => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Email and password required"),
                ),
                AuthError::InvalidEmail(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Invalid email address"),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
                AuthError::UserAlreadyExists => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Email already registered"),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    ErrorBody::new("Invalid credentials"),
                ),
                AuthError::Token(_) => (StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthorized")),
                AuthError::Repository(_) | AuthError::PasswordHash => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Authentication failed"),
                ),
            },
            Self::NotFound(what) => (StatusCode::NOT_FOUND, ErrorBody::new(what)),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthorized")),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("Admin access required"),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            Self::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: Some(msg),
                    ..ErrorBody::new("Invalid request body")
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// `axum::Json` with rejections reported as [`AppError::InvalidBody`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
