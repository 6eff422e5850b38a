//! Registration and login flows

use super::{
    error::AuthError,
    jwt::{AccessToken, JwtService},
    password::CredentialHasher,
};
use roster_core::{BootstrapAdmin, NewPrincipal, Principal, PrincipalStore, Role, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// User registration request
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// User login request
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Public principal information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrincipalInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&Principal> for PrincipalInfo {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            role: principal.role,
        }
    }
}

/// User service for authentication operations
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn PrincipalStore>,
    hasher: CredentialHasher,
    jwt: Arc<JwtService>,
    /// Verified against when the username is unknown so both login failures cost the same
    dummy_hash: Arc<str>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn PrincipalStore>,
        hasher: CredentialHasher,
        jwt: Arc<JwtService>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("roster-login-timing-equaliser")?;

        Ok(Self {
            store,
            hasher,
            jwt,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Register new user
    pub async fn register(&self, request: RegisterRequest) -> Result<PrincipalInfo, AuthError> {
        if self.store.find_by_username(&request.username).await?.is_some() {
            debug!("Username already registered: {}", request.username);
            return Err(AuthError::UsernameTaken);
        }

        if self.store.find_by_email(&request.email).await?.is_some() {
            debug!("Email already registered for username: {}", request.username);
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_blocking(request.password).await?;

        let principal = self
            .store
            .insert(NewPrincipal {
                username: request.username,
                email: request.email,
                password_hash,
                role: request.role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { field } if field == "email" => AuthError::EmailTaken,
                StoreError::Duplicate { .. } => AuthError::UsernameTaken,
                other => AuthError::Store(other),
            })?;

        info!(
            principal_id = principal.id,
            role = %principal.role,
            "Registered user: {}",
            principal.username
        );
        Ok(PrincipalInfo::from(&principal))
    }

    /// Login user
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, request: LoginRequest) -> Result<AccessToken, AuthError> {
        let principal = self.store.find_by_username(&request.username).await?;

        let stored_hash = principal
            .as_ref()
            .map(|p| p.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.to_string());

        let verified = self.verify_blocking(request.password, stored_hash).await?;

        match principal {
            Some(principal) if verified => {
                let token = self.jwt.issue(&principal, None)?;
                info!(principal_id = principal.id, "User logged in: {}", principal.username);
                Ok(token)
            }
            _ => {
                warn!("Failed login attempt for username: {}", request.username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Create the configured admin account unless the username is taken
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<(), AuthError> {
        if self.store.find_by_username(&admin.username).await?.is_some() {
            debug!("Bootstrap admin already exists: {}", admin.username);
            return Ok(());
        }

        self.register(RegisterRequest {
            username: admin.username.clone(),
            password: admin.password.clone(),
            email: admin.email.clone(),
            role: Role::Admin,
        })
        .await?;

        info!("Created bootstrap admin user: {}", admin.username);
        Ok(())
    }

    async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::Hashing)?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|_| AuthError::Hashing)
    }
}
