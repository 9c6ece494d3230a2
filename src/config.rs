//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Token signing secret (min 16 chars)
//! - `DATABASE_URL` - `PostgreSQL` connection string, when the backend is `postgres`
//!
//! ## Optional
//! - `PORT` - Listen port (default: 8083)
//! - `STORAGE_BACKEND` - `postgres` or `memory` (default: `postgres` if
//!   `DATABASE_URL` is set, otherwise `memory`)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `TOKEN_TTL_DAYS` - Token lifetime (default: 30)
//! - `SEED_ON_STARTUP` - Seed the catalog when it is empty (default: false)

use std::net::{Ipv4Addr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

#[derive(Clone, Debug)]
pub enum StorageConfig {
    Postgres { database_url: SecretString, max_connections: u32 },
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub storage: StorageConfig,
    pub jwt_secret: SecretString,
    pub token_ttl_days: i64,
    pub seed_on_startup: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or(&lookup, "PORT", 8083u16)?;

        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        let backend = lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| (if database_url.is_some() { "postgres" } else { "memory" }).to_string());
        let storage = match backend.to_ascii_lowercase().as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: SecretString::from(
                    database_url.ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
                ),
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32)?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORAGE_BACKEND".to_string(),
                    format!("expected postgres or memory, got {other}"),
                ))
            }
        };

        let jwt_secret =
            SecretString::from(lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?);
        if jwt_secret.expose_secret().chars().count() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InsecureSecret(
                "JWT_SECRET".to_string(),
                format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
            ));
        }

        let token_ttl_days = parse_or(&lookup, "TOKEN_TTL_DAYS", 30i64)?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::InvalidEnvVar("TOKEN_TTL_DAYS".to_string(), "must be positive".to_string()));
        }

        Ok(Self {
            port,
            storage,
            jwt_secret,
            token_ttl_days,
            seed_on_startup: parse_or(&lookup, "SEED_ON_STARTUP", false)?,
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const SECRET: (&str, &str) = ("JWT_SECRET", "a-long-enough-signing-key");

    #[test]
    fn test_defaults_to_memory() {
        let config = load(&[SECRET]).unwrap();
        assert_eq!(config.port, 8083);
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.token_ttl_days, 30);
        assert!(!config.seed_on_startup);
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = load(&[SECRET, ("DATABASE_URL", "postgres://localhost/casa"), ("DB_MAX_CONNECTIONS", "4")]).unwrap();
        match config.storage {
            StorageConfig::Postgres { database_url, max_connections } => {
                assert_eq!(database_url.expose_secret(), "postgres://localhost/casa");
                assert_eq!(max_connections, 4);
            }
            StorageConfig::Memory => panic!("expected postgres"),
        }
    }

    #[test]
    fn test_explicit_memory_wins() {
        let config = load(&[SECRET, ("DATABASE_URL", "postgres://localhost/casa"), ("STORAGE_BACKEND", "memory")]).unwrap();
        assert!(matches!(config.storage, StorageConfig::Memory));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(_))));
        assert!(matches!(load(&[("JWT_SECRET", "short")]), Err(ConfigError::InsecureSecret(..))));
        assert!(matches!(load(&[SECRET, ("PORT", "http")]), Err(ConfigError::InvalidEnvVar(..))));
        assert!(matches!(load(&[SECRET, ("STORAGE_BACKEND", "mongo")]), Err(ConfigError::InvalidEnvVar(..))));
        assert!(matches!(load(&[SECRET, ("STORAGE_BACKEND", "postgres")]), Err(ConfigError::MissingEnvVar(_))));
    }
}
