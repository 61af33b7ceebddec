//! Error types for the user-management service
//!
//! [`AuthError`] is the closed set of decisions the authentication core can
//! reach. [`ApiError`] is what handlers return; it owns the mapping onto
//! HTTP status codes so nothing below the router knows about transport.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::password::PasswordError;

/// Terminal outcomes of the authentication and authorization pipeline
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Hashing was attempted on a zero-length secret
    #[error("password must not be empty")]
    EmptyInput,

    /// No credential was presented, or the carrier was malformed
    #[error("missing or malformed token")]
    MissingToken,

    /// Bad structure, bad signature, disallowed algorithm or unusable claims
    #[error("invalid token")]
    InvalidToken,

    /// Well-formed and authentic, but past its expiry
    #[error("expired token")]
    ExpiredToken,

    /// Authenticated principal below the required role
    #[error("insufficient role")]
    InsufficientRole,

    /// The targeted user does not exist
    #[error("user not found")]
    NotFound,
}

/// Custom error type for the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request body failed validation
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many failed logins for this account
    #[error("Too many failed login attempts")]
    TooManyAttempts,

    /// Unexpected failure; the cause is logged, not returned
    #[error("Internal server error")]
    InternalServerError,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Auth(AuthError::MissingToken) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            // One message for every rejected credential so callers cannot
            // tell which check failed.
            ApiError::Auth(
                AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::InsufficientRole,
            ) => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::Auth(AuthError::EmptyInput) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::EmptyInput.to_string(),
            ),
            ApiError::Auth(AuthError::NotFound) => {
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            ApiError::InvalidCredentials => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts".to_string(),
            ),
            ApiError::Database(DatabaseError::Duplicate(field)) => {
                (StatusCode::CONFLICT, duplicate_message(&field))
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::EmptyInput => ApiError::Auth(AuthError::EmptyInput),
            PasswordError::Hash(e) => {
                error!("Password hashing failed: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

fn duplicate_message(field: &str) -> String {
    if field.contains("email") {
        "Email is already taken".to_string()
    } else if field.contains("username") {
        "Username is already taken".to_string()
    } else {
        "User already exists".to_string()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
