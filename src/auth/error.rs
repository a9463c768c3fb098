// Authentication and account error types

use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::auth::models::Role;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    ValidationError(String),

    #[error("Request validation failed")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Phone number already exists. Please use a different phone number.")]
    PhoneTaken,

    #[error("Email address already exists. Please use a different email address.")]
    EmailTaken,

    #[error("User not found.")]
    UserNotFound,

    #[error("Insufficient permissions: required role '{required}', but user has role '{actual}'")]
    InsufficientPermissions { required: Role, actual: Role },

    #[error("{0}")]
    Forbidden(String),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidRequest(errors) => ApiError::ValidationError(errors),
            AuthError::ValidationError(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MissingToken => ApiError::Unauthorized(err.to_string()),
            AuthError::UsernameTaken | AuthError::PhoneTaken | AuthError::EmailTaken => {
                ApiError::Conflict {
                    message: err.to_string(),
                }
            }
            AuthError::UserNotFound => ApiError::NotFound {
                resource: "User".to_string(),
                id: "requested".to_string(),
            },
            AuthError::InsufficientPermissions { required, actual } => {
                warn!("Authorization failed: required role '{}', user has role '{}'", required, actual);
                ApiError::Forbidden(format!("Insufficient permissions: required role '{}'", required))
            }
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::PasswordHashError | AuthError::TokenGenerationError(_) => {
                ApiError::InternalError(err.to_string())
            }
            AuthError::DatabaseError(db) => ApiError::DatabaseError(db),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
