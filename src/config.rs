//! Runtime configuration read from the environment (and `.env` via dotenvy).

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 120;
const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection URL; only required when serving from the database
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    /// Password for the bootstrap `root` account, created when no users exist
    pub root_password: Option<String>,
    pub sentry_dsn: Option<String>,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret =
            get("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired("JWT_SECRET".into()))?;

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(value) => parse_hmac_algorithm(&value)?,
            None => Algorithm::HS256,
        };

        let token_ttl_minutes = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| invalid("ACCESS_TOKEN_EXPIRE_MINUTES", "expected a positive integer"))?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .ok_or_else(|| invalid("BCRYPT_COST", "expected an integer between 4 and 31"))?,
            None => DEFAULT_BCRYPT_COST,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret,
            jwt_algorithm,
            token_ttl: Duration::minutes(token_ttl_minutes),
            bcrypt_cost,
            root_password: get("ROOT_PASSWORD"),
            sentry_dsn: get("SENTRY_DSN"),
            environment: get("TRACKER_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".into()))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Tokens are signed with a shared secret, so only the HMAC family is usable.
fn parse_hmac_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(value.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        Ok(_) => Err(invalid("JWT_ALGORITHM", "only HS256, HS384 and HS512 are supported")),
        Err(_) => Err(invalid("JWT_ALGORITHM", "unknown algorithm")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("JWT_SECRET", "secret")]).unwrap();
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.token_ttl, Duration::minutes(120));
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.database_url, None);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_missing_secret() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::MissingRequired("JWT_SECRET".into())
        );
        assert!(config_from(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_algorithm_must_be_hmac() {
        let config = config_from(&[("JWT_SECRET", "s"), ("JWT_ALGORITHM", "HS512")]).unwrap();
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);

        assert!(config_from(&[("JWT_SECRET", "s"), ("JWT_ALGORITHM", "RS256")]).is_err());
        assert!(config_from(&[("JWT_SECRET", "s"), ("JWT_ALGORITHM", "nope")]).is_err());
    }

    #[test]
    fn test_numeric_values_are_validated() {
        assert!(config_from(&[("JWT_SECRET", "s"), ("BCRYPT_COST", "2")]).is_err());
        assert!(
            config_from(&[("JWT_SECRET", "s"), ("ACCESS_TOKEN_EXPIRE_MINUTES", "-5")]).is_err()
        );

        let config = config_from(&[
            ("JWT_SECRET", "s"),
            ("BCRYPT_COST", "4"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "15"),
        ])
        .unwrap();
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.token_ttl, Duration::minutes(15));
    }

    #[test]
    fn test_require_database_url() {
        let config = config_from(&[("JWT_SECRET", "s")]).unwrap();
        assert!(config.require_database_url().is_err());

        let config =
            config_from(&[("JWT_SECRET", "s"), ("DATABASE_URL", "postgres://localhost/t")]).unwrap();
        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/t");
    }
}
