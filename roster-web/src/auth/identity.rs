//! Resolve verified token claims to the live principal

use super::{error::AuthError, jwt::Claims};
use roster_core::{Principal, PrincipalStore};
use std::sync::Arc;
use tracing::{debug, error};

/// Looks up the principal behind already-verified claims
///
/// The returned principal reflects the store as it is now, so a role change
/// or deletion after issuance is honoured on the next request.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn PrincipalStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, claims: &Claims) -> Result<Principal, AuthError> {
        let id = claims.subject_id()?;

        match self.store.find_by_id(id).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => {
                debug!(principal_id = id, "Token subject not found");
                Err(AuthError::PrincipalNotFound)
            }
            Err(e) => {
                error!(principal_id = id, "Failed to resolve principal: {}", e);
                Err(AuthError::Store(e))
            }
        }
    }
}
