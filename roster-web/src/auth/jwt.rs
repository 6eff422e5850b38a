//! Signed, time-limited bearer tokens

use super::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roster_core::{AuthConfig, Principal, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Scheme literal returned alongside every issued token
pub const TOKEN_TYPE: &str = "bearer";

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (principal id, decimal)
    pub sub: String,
    /// Username at issuance time
    pub username: String,
    /// Role at issuance time; authorization uses the live role instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Principal id carried in `sub`
    pub fn subject_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Token returned by a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Issues and verifies access tokens with one process-wide secret
pub struct JwtService {
    keys: Keys,
    algorithm: Algorithm,
    validation: Validation,
    default_ttl: Duration,
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Create a service for an HMAC algorithm
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: Keys::new(secret),
            algorithm,
            validation,
            default_ttl,
        }
    }

    /// Build from configuration; the algorithm name must be an HMAC variant
    pub fn from_config(config: &AuthConfig) -> Result<Self, String> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm)
            .map_err(|e| format!("Unknown JWT algorithm '{}': {}", config.jwt_algorithm, e))?;

        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(format!(
                "JWT algorithm '{}' is not an HMAC algorithm",
                config.jwt_algorithm
            ));
        }

        let default_ttl = config.access_token_ttl().map_err(|e| e.to_string())?;

        Ok(Self::new(config.jwt_secret.as_bytes(), algorithm, default_ttl))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `principal`, valid for `ttl` or the configured default
    pub fn issue(
        &self,
        principal: &Principal,
        ttl: Option<Duration>,
    ) -> Result<AccessToken, AuthError> {
        self.issue_at(principal, ttl.unwrap_or(self.default_ttl), Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            warn!(ttl_seconds = ttl.num_seconds(), "Token lifetime overflows the clock");
            AuthError::TokenCreation
        })?;

        let claims = Claims {
            sub: principal.id.to_string(),
            username: principal.username.clone(),
            role: Some(principal.role),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(self.algorithm), &claims, &self.keys.encoding)
            .map_err(|e| {
                warn!("Failed to encode JWT token: {}", e);
                AuthError::TokenCreation
            })?;

        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    /// Verify and decode token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock value `now`
    ///
    /// Valid iff the signature matches and `iat <= now < exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.keys.decoding, &self.validation).map_err(|e| {
                debug!("Token verification failed: {}", e);
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;
        let now = now.timestamp();

        if claims.exp <= now {
            debug!(sub = %claims.sub, "Token expired");
            return Err(AuthError::InvalidToken);
        }

        if claims.iat > now {
            debug!(sub = %claims.sub, "Token used before issuance");
            return Err(AuthError::InvalidToken);
        }

        claims.subject_id()?;
        Ok(claims)
    }
}
