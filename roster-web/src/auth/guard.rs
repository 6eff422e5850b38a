//! Role allow-lists applied after authentication

use super::error::AuthError;
use roster_core::{Principal, Role};
use tracing::warn;

/// Reusable authorization check over a fixed set of roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGuard {
    allowed: &'static [Role],
}

impl RoleGuard {
    /// Mutating student operations
    pub const ADMIN_ONLY: RoleGuard = RoleGuard::require(&[Role::Admin]);

    pub const fn require(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        self.allowed
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    /// Pass `principal` through if its current role is allowed
    pub fn authorize(&self, principal: Principal) -> Result<Principal, AuthError> {
        if self.permits(principal.role) {
            Ok(principal)
        } else {
            warn!(
                user = %principal.username,
                role = %principal.role,
                allowed = ?self.allowed,
                "Role not permitted for operation"
            );
            Err(AuthError::Forbidden)
        }
    }
}
