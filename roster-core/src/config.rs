//! Configuration management
//!
//! Sources are layered, later ones winning: built-in defaults, a TOML file,
//! `ROSTER__<SECTION>__<KEY>` environment variables, then the legacy
//! `JWT_SECRET_KEY` / `JWT_ALGORITHM` / `ACCESS_TOKEN_EXPIRE_MINUTES` /
//! `DATABASE_URL` variables.

use crate::error::RosterResult;
use crate::logging::LoggingConfig;
use crate::{config_error, validation_error};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// File read when no explicit path is given; optional
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

/// Signing secret used when none is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "roster-dev-secret-change-me";

/// HMAC algorithms accepted for token signing
pub const SUPPORTED_JWT_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Longest accepted access token lifetime: one year
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 365 * 24 * 60;

/// Complete service configuration, immutable once loaded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS
    pub cors_origins: Vec<String>,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            dev_mode: false,
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL; records are kept in memory when unset
    pub url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    /// Admin account created at start-up when its username is not taken
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            bootstrap_admin: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl AuthConfig {
    /// Default lifetime of issued access tokens
    pub fn access_token_ttl(&self) -> RosterResult<chrono::Duration> {
        chrono::Duration::try_minutes(self.access_token_expire_minutes)
            .filter(|_| self.access_token_expire_minutes <= MAX_ACCESS_TOKEN_EXPIRE_MINUTES)
            .ok_or_else(|| {
                validation_error!(
                    format!(
                        "Access token lifetime of {} minutes is out of range",
                        self.access_token_expire_minutes
                    ),
                    "auth.access_token_expire_minutes",
                    "config"
                )
            })
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RosterConfig {
    /// Load configuration using the process environment
    pub fn load(path: Option<&Path>) -> RosterResult<Self> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// Load configuration with an explicit environment map
    pub fn load_from(path: Option<&Path>, env: HashMap<String, String>) -> RosterResult<Self> {
        let defaults = Config::try_from(&RosterConfig::default())
            .map_err(|e| config_error!("Failed to build default configuration", "config", e))?;

        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let legacy = |key: &str| env.get(key).cloned();

        let config = Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                Environment::with_prefix("ROSTER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .source(Some(env.clone().into_iter().collect())),
            )
            .set_override_option("auth.jwt_secret", legacy("JWT_SECRET_KEY"))
            .and_then(|b| b.set_override_option("auth.jwt_algorithm", legacy("JWT_ALGORITHM")))
            .and_then(|b| {
                b.set_override_option(
                    "auth.access_token_expire_minutes",
                    legacy("ACCESS_TOKEN_EXPIRE_MINUTES"),
                )
            })
            .and_then(|b| b.set_override_option("database.url", legacy("DATABASE_URL")))
            .map_err(|e| config_error!("Failed to apply environment overrides", "config", e))?
            .build()
            .map_err(|e| config_error!(format!("Failed to read configuration: {}", e), "config", e))?;

        config
            .try_deserialize()
            .map_err(|e| config_error!(format!("Failed to parse configuration: {}", e), "config", e))
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> RosterResult<()> {
        if self.server.port == 0 {
            return Err(validation_error!(
                "Server port must be greater than 0",
                "server.port",
                "config"
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(config_error!("JWT signing secret must not be empty", "config"));
        }

        if !SUPPORTED_JWT_ALGORITHMS.contains(&self.auth.jwt_algorithm.as_str()) {
            return Err(validation_error!(
                format!(
                    "Unsupported JWT algorithm '{}', expected one of {:?}",
                    self.auth.jwt_algorithm, SUPPORTED_JWT_ALGORITHMS
                ),
                "auth.jwt_algorithm",
                "config"
            ));
        }

        if self.auth.access_token_expire_minutes <= 0 {
            return Err(validation_error!(
                "Access token lifetime must be positive",
                "auth.access_token_expire_minutes",
                "config"
            ));
        }

        if self.auth.access_token_expire_minutes > MAX_ACCESS_TOKEN_EXPIRE_MINUTES {
            return Err(validation_error!(
                format!(
                    "Access token lifetime must not exceed {} minutes",
                    MAX_ACCESS_TOKEN_EXPIRE_MINUTES
                ),
                "auth.access_token_expire_minutes",
                "config"
            ));
        }

        if let Some(admin) = &self.auth.bootstrap_admin {
            if admin.username.is_empty() || admin.email.is_empty() || admin.password.is_empty() {
                return Err(validation_error!(
                    "Bootstrap admin needs a username, email and password",
                    "auth.bootstrap_admin",
                    "config"
                ));
            }
        }

        if self.auth.jwt_secret == DEV_JWT_SECRET && !self.server.dev_mode {
            warn!("Using the built-in development JWT secret; set ROSTER__AUTH__JWT_SECRET");
        }

        Ok(())
    }
}
