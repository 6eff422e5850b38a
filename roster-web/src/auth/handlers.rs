//! Authentication handlers for user registration, login, and identity lookup

use super::{
    error::AuthError,
    jwt::AccessToken,
    users::{LoginRequest, PrincipalInfo, RegisterRequest},
    CurrentUser,
};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;

/// User registration endpoint
///
/// Creates an account; the role defaults to `user` when omitted.
pub async fn register_user(
    State(app_state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PrincipalInfo>), AuthError> {
    info!("User registration attempt: {}", request.username);

    let principal = app_state.user_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(principal)))
}

/// User login endpoint
///
/// Exchanges username and password for a bearer token.
pub async fn login_user(
    State(app_state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AccessToken>, AuthError> {
    info!("User login attempt: {}", request.username);

    let token = app_state.user_service.login(request).await?;

    Ok(Json(token))
}

/// Get current user information
pub async fn get_current_user(CurrentUser(principal): CurrentUser) -> Json<PrincipalInfo> {
    Json(PrincipalInfo::from(&principal))
}
