//! Authentication and authorization failures as seen by callers

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use roster_core::StoreError;
use serde_json::json;

/// Auth errors
///
/// Every token problem collapses into [`AuthError::InvalidToken`] so the
/// response never reveals which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already registered")]
    UsernameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing authorization header")]
    MissingCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token subject no longer exists")]
    PrincipalNotFound,
    #[error("Not enough permissions")]
    Forbidden,
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Password hashing failed")]
    Hashing,
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::UsernameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::InvalidToken
            | AuthError::PrincipalNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Store(StoreError::Duplicate { .. }) => StatusCode::CONFLICT,
            AuthError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Store(StoreError::Corrupt(_))
            | AuthError::TokenCreation
            | AuthError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is simply not authenticated
    pub fn is_unauthenticated(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match &self {
            AuthError::UsernameTaken => ("conflict", "Username already registered"),
            AuthError::EmailTaken => ("conflict", "Email already registered"),
            AuthError::Store(StoreError::Duplicate { .. }) => {
                ("conflict", "Username or email already registered")
            }
            AuthError::InvalidCredentials => {
                ("invalid_credentials", "Invalid username or password")
            }
            AuthError::MissingCredentials
            | AuthError::InvalidToken
            | AuthError::PrincipalNotFound => {
                ("unauthenticated", "Could not validate credentials")
            }
            AuthError::Forbidden => ("forbidden", "Not enough permissions"),
            AuthError::Store(StoreError::Unavailable(_)) => {
                ("service_unavailable", "Record store is unavailable")
            }
            AuthError::TokenCreation | AuthError::Hashing | AuthError::Store(_) => {
                ("internal_error", "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
