//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Token signing secret (min 32 chars). There is no fallback;
//!   the server refuses to start without it.
//!
//! ## Optional
//! - `DATABASE_URL` - `PostgreSQL` connection string. When unset the server runs
//!   on in-memory stores and nothing survives a restart.
//! - `BIND_ADDRESS` - Listen address (default: 0.0.0.0:3000)
//! - `ALLOWED_ORIGINS` - Comma-separated CORS allowlist
//! - `PASSWORD_HASH_COST` - Argon2 iteration count (default: 3)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `RUN_MIGRATIONS` - Apply embedded migrations at startup (default: true)

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
pub const DEFAULT_PASSWORD_HASH_COST: u32 = 3;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// `None` selects the in-memory stores
    pub database_url: Option<SecretString>,
    pub jwt_secret: SecretString,
    pub allowed_origins: Vec<String>,
    pub password_hash_cost: u32,
    pub log_format: LogFormat,
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret)?;

        let database_url = optional("DATABASE_URL").map(SecretString::from);

        let bind_address =
            optional("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let password_hash_cost = match optional("PASSWORD_HASH_COST") {
            Some(raw) => parse_cost(&raw)?,
            None => DEFAULT_PASSWORD_HASH_COST,
        };

        let log_format = match optional("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected `pretty` or `json`, got `{other}`"),
                ))
            }
        };

        let run_migrations = match optional("RUN_MIGRATIONS") {
            Some(raw) => parse_bool("RUN_MIGRATIONS", &raw)?,
            None => true,
        };

        Ok(Self {
            bind_address,
            database_url,
            jwt_secret: SecretString::from(jwt_secret),
            allowed_origins,
            password_hash_cost,
            log_format,
            run_migrations,
        })
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

/// Value kept byte-for-byte; only an all-blank value counts as missing
fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Unset and blank values are treated the same
fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_jwt_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            "JWT_SECRET".to_string(),
            format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn parse_cost(raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(cost) if cost >= 1 => Ok(cost),
        _ => Err(ConfigError::InvalidEnvVar(
            "PASSWORD_HASH_COST".to_string(),
            "must be a positive integer".to_string(),
        )),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("expected a boolean, got `{raw}`"),
        )),
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration that never reads the environment
    pub(crate) fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_url: None,
            jwt_secret: SecretString::from(jwt_secret.to_string()),
            allowed_origins: Vec::new(),
            password_hash_cost: 1,
            log_format: LogFormat::Pretty,
            run_migrations: false,
        }
    }
}
