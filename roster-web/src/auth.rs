//! Authentication and authorization
//!
//! A protected request walks `verify token -> resolve principal -> check role`.
//! Any failure before the role check answers 401; a role miss answers 403.

pub mod error;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod users;

#[cfg(test)]
mod tests;

pub use error::AuthError;
pub use guard::RoleGuard;

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use roster_core::Principal;

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Run the full authentication chain for a set of request headers
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.jwt.verify(token)?;
    state.identity.resolve(&claims).await
}

/// Any authenticated principal
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let principal = authenticate(&app_state, &parts.headers).await?;
        Ok(CurrentUser(principal))
    }
}

/// Authenticated principal whose current role passes [`RoleGuard::ADMIN_ONLY`]
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        RoleGuard::ADMIN_ONLY.authorize(principal).map(AdminUser)
    }
}
