//! Tests for the authentication and authorization chain

use super::*;
use crate::auth::users::{LoginRequest, RegisterRequest};
use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request},
};
use roster_core::{
    BootstrapAdmin, NewPrincipal, PrincipalStore, Role, RosterConfig, StoreError, StoreResult,
};
use std::sync::Arc;

/// Principal store whose backend is down
struct UnreachableStore;

#[async_trait::async_trait]
impl PrincipalStore for UnreachableStore {
    async fn find_by_id(&self, _id: i64) -> StoreResult<Option<Principal>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_username(&self, _username: &str) -> StoreResult<Option<Principal>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_email(&self, _email: &str) -> StoreResult<Option<Principal>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _principal: NewPrincipal) -> StoreResult<Principal> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Helper function to create test request parts
fn parts_with_headers(headers: HeaderMap) -> Parts {
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/test")
        .body(Body::empty())
        .unwrap();

    *request.headers_mut() = headers;
    request.into_parts().0
}

async fn test_state() -> AppState {
    AppState::in_memory(&RosterConfig::default()).await.unwrap()
}

fn headers_with_authorization(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

fn register_request(username: &str, email: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: "p@ss".to_string(),
        email: email.to_string(),
        role,
    }
}

/// Register `username` and return a bearer header for it
async fn login_headers(state: &AppState, username: &str, role: Role) -> HeaderMap {
    state
        .user_service
        .register(register_request(
            username,
            &format!("{}@x.com", username),
            role,
        ))
        .await
        .unwrap();

    let token = state
        .user_service
        .login(LoginRequest {
            username: username.to_string(),
            password: "p@ss".to_string(),
        })
        .await
        .unwrap();

    headers_with_authorization(&format!("Bearer {}", token.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(
            bearer_token(&headers_with_authorization("Bearer abc.def.ghi")).unwrap(),
            "abc.def.ghi"
        );
        assert_eq!(
            bearer_token(&headers_with_authorization("bearer abc")).unwrap(),
            "abc"
        );
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers_with_authorization("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with_authorization("Bearer")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_current_user_extraction() {
        let state = test_state().await;
        let headers = login_headers(&state, "alice", Role::User).await;
        let mut parts = parts_with_headers(headers);

        let CurrentUser(principal) = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_and_garbage_tokens_are_unauthenticated() {
        let state = test_state().await;

        let mut parts = parts_with_headers(HeaderMap::new());
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
        assert!(err.is_unauthenticated());

        let mut parts = parts_with_headers(headers_with_authorization("Bearer garbage"));
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_admin_extraction() {
        let state = test_state().await;

        let admin_headers = login_headers(&state, "root", Role::Admin).await;
        let mut parts = parts_with_headers(admin_headers);
        let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let user_headers = login_headers(&state, "bob", Role::User).await;
        let mut parts = parts_with_headers(user_headers);
        assert!(matches!(
            AdminUser::from_request_parts(&mut parts, &state).await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_live_role_wins_over_token_claim() {
        let state = test_state().await;
        let stored = state
            .user_service
            .register(register_request("carol", "c@x.com", Role::User))
            .await
            .unwrap();

        // Token claims admin, the stored record says user
        let forged_view = NewPrincipal {
            username: stored.username.clone(),
            email: stored.email.clone(),
            password_hash: String::new(),
            role: Role::Admin,
        }
        .with_id(stored.id);
        let token = state.jwt.issue(&forged_view, None).unwrap();

        let mut parts = parts_with_headers(headers_with_authorization(&format!(
            "Bearer {}",
            token.access_token
        )));
        assert!(matches!(
            AdminUser::from_request_parts(&mut parts, &state).await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_token_for_unknown_principal_is_unauthenticated() {
        let state = test_state().await;
        let ghost = NewPrincipal {
            username: "ghost".to_string(),
            email: "g@x.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        }
        .with_id(999);
        let token = state.jwt.issue(&ghost, None).unwrap();

        let claims = state.jwt.verify(&token.access_token).unwrap();
        let err = state.identity.resolve(&claims).await.unwrap_err();
        assert!(matches!(err, AuthError::PrincipalNotFound));
        assert!(err.is_unauthenticated());
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let state = test_state().await;
        let service = &state.user_service;

        let info = service
            .register(register_request("alice", "a@x.com", Role::Admin))
            .await
            .unwrap();
        assert_eq!(info.id, 1);
        assert_eq!(info.role, Role::Admin);

        // Both taken: the username is reported
        assert!(matches!(
            service
                .register(register_request("alice", "a@x.com", Role::User))
                .await,
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            service
                .register(register_request("alicia", "a@x.com", Role::User))
                .await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = test_state().await;
        let service = &state.user_service;
        service
            .register(register_request("alice", "a@x.com", Role::User))
            .await
            .unwrap();

        let wrong_password = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginRequest {
                username: "mallory".to_string(),
                password: "p@ss".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let state = test_state().await;
        let info = state
            .user_service
            .register(register_request("dave", "d@x.com", Role::User))
            .await
            .unwrap();

        let token = state
            .user_service
            .login(LoginRequest {
                username: "dave".to_string(),
                password: "p@ss".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 30 * 60);
        let claims = state.jwt.verify(&token.access_token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), info.id);
        assert_eq!(claims.username, "dave");
    }

    #[tokio::test]
    async fn test_bootstrap_admin_created_once() {
        let mut config = RosterConfig::default();
        config.auth.bootstrap_admin = Some(BootstrapAdmin {
            username: "admin".to_string(),
            email: "admin@x.com".to_string(),
            password: "s3cret".to_string(),
        });

        let state = AppState::in_memory(&config).await.unwrap();
        let admin = config.auth.bootstrap_admin.as_ref().unwrap();
        state.user_service.ensure_admin(admin).await.unwrap();

        let token = state
            .user_service
            .login(LoginRequest {
                username: "admin".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();
        let claims = state.jwt.verify(&token.access_token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 1);
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_store_outage_is_not_reported_as_bad_token() {
        let state = AppState::with_stores(
            &RosterConfig::default(),
            Arc::new(UnreachableStore),
            Arc::new(crate::memory::MemoryStore::new()),
        )
        .await
        .unwrap();

        let principal = NewPrincipal {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        }
        .with_id(1);
        let token = state.jwt.issue(&principal, None).unwrap();
        let headers = headers_with_authorization(&format!("Bearer {}", token.access_token));

        let err = authenticate(&state, &headers).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Store(StoreError::Unavailable(_))
        ));
        assert!(!err.is_unauthenticated());

        let response = axum::response::IntoResponse::into_response(err);
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(axum::http::header::WWW_AUTHENTICATE).is_none());

        // Same outcome through the router
        let app = crate::create_app(state);
        let request = Request::builder()
            .uri("/students")
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
            .body(Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_out_of_range_token_lifetime_rejected_at_startup() {
        let mut config = RosterConfig::default();
        config.auth.access_token_expire_minutes = 200_000_000_000;

        let result = AppState::in_memory(&config).await;
        assert!(matches!(result, Err(crate::WebError::Config(_))));
    }
}
