//! Application state shared by every request handler

use crate::{
    auth::{
        identity::IdentityResolver, jwt::JwtService, password::CredentialHasher,
        users::UserService,
    },
    database::SqliteStore,
    memory::MemoryStore,
    WebError, WebResult,
};
use roster_core::{PrincipalStore, RosterConfig, StudentStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<RosterConfig>,
    /// Token issuance and verification
    pub jwt: Arc<JwtService>,
    /// Claims to live principal lookup
    pub identity: IdentityResolver,
    /// Registration and login
    pub user_service: UserService,
    /// Student record store
    pub students: Arc<dyn StudentStore>,
}

impl AppState {
    /// Create state from configuration, opening SQLite when a database URL is set
    pub async fn new(config: &RosterConfig) -> WebResult<Self> {
        match &config.database.url {
            Some(url) => {
                let store = Arc::new(SqliteStore::connect(url).await?);
                info!("Using SQLite record store");
                Self::with_stores(config, store.clone(), store).await
            }
            None => {
                info!("No database configured, using in-memory record store");
                Self::in_memory(config).await
            }
        }
    }

    /// Create state backed by a fresh in-memory store
    pub async fn in_memory(config: &RosterConfig) -> WebResult<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store).await
    }

    /// Create state over explicit stores and create the bootstrap admin if configured
    pub async fn with_stores(
        config: &RosterConfig,
        principals: Arc<dyn PrincipalStore>,
        students: Arc<dyn StudentStore>,
    ) -> WebResult<Self> {
        let jwt = Arc::new(JwtService::from_config(&config.auth).map_err(WebError::Config)?);

        let user_service = UserService::new(
            principals.clone(),
            CredentialHasher::default(),
            jwt.clone(),
        )
        .map_err(|e| WebError::Auth(e.to_string()))?;

        if let Some(admin) = &config.auth.bootstrap_admin {
            user_service
                .ensure_admin(admin)
                .await
                .map_err(|e| WebError::Auth(format!("Failed to create bootstrap admin: {}", e)))?;
        }

        Ok(Self {
            config: Arc::new(config.clone()),
            jwt,
            identity: IdentityResolver::new(principals),
            user_service,
            students,
        })
    }
}
