//! Salted one-way password hashing with Argon2
//!
//! Passwords are cut to [`MAX_PASSWORD_BYTES`] bytes before hashing and before
//! verification alike. Two passwords that agree on their first 72 bytes are
//! therefore the same password. Changing the limit would orphan every hash
//! already stored, so it stays fixed.

use super::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, error};

/// Bytes of a password that take part in hashing
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cut `password` to at most [`MAX_PASSWORD_BYTES`] bytes, dropping a
/// multi-byte character that would straddle the limit
pub fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }

    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

/// Argon2id hasher producing PHC strings
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(argon2: Argon2<'static>) -> Self {
        Self { argon2 }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(truncate_password(password).as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                AuthError::Hashing
            })
    }

    /// Check a candidate password against a stored hash
    ///
    /// A stored value that is not a valid PHC string never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(truncate_password(password).as_bytes(), &parsed_hash)
            .is_ok()
    }
}
