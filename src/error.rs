use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned for every rejected login, whether the username is unknown
/// or the password is wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";

/// Message returned for every rejected protected request.
pub const UNAUTHENTICATED_MESSAGE: &str = "authentication required";

/// StoreError
///
/// Failures raised by a `Repository` implementation. These are never shown to
/// clients verbatim; `AppError` collapses them into a generic 500 body.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// AppError
///
/// The error taxonomy shared by every component. Each variant maps to exactly
/// one HTTP status in `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing client input (400).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, malformed, forged or expired session token (401).
    #[error("unauthenticated")]
    Unauthenticated,

    /// Unknown username or wrong password (401). One variant for both.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Server-side failures that are not persistence related, e.g. token signing.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Unauthenticated => UNAUTHENTICATED_MESSAGE.to_string(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::NotFound => "post not found".to_string(),
            AppError::Store(_) | AppError::Internal(_) => {
                "an internal server error occurred".to_string()
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// An id that cannot name a post (not a number, out of range) is an unknown post.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("path rejected: {}", rejection.body_text());
        AppError::NotFound
    }
}

/// ErrorBody
///
/// Wire shape of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
