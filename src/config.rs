//! Configuration module
//!
//! Settings come from an optional TOML file, then environment variables
//! (`JWT_SECRET`, `JWT_EXPIRE`, `PORT`, `HOST`, `DATABASE_URL`,
//! `BCRYPT_COST`), then command-line flags applied by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::crypto::jwt::{JwtConfig, DEFAULT_EXPIRATION_SECS};
use crate::infrastructure::crypto::password::DEFAULT_PASSWORD_COST;
use crate::infrastructure::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Default config location: `<user config dir>/verify-aml/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("verify-aml")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite URL; accounts are kept in memory when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub jwt_expire_secs: i64,
    /// bcrypt work factor
    pub password_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expire_secs: DEFAULT_EXPIRATION_SECS,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &if self.jwt_secret.is_empty() { "<empty>" } else { "<set>" })
            .field("jwt_expire_secs", &self.jwt_expire_secs)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// First admin account, created only when the store is empty.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            email: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Some(value) = lookup("JWT_EXPIRE") {
            self.security.jwt_expire_secs = parse_env("JWT_EXPIRE", value)?;
        }
        if let Some(value) = lookup("BCRYPT_COST") {
            self.security.password_cost = parse_env("BCRYPT_COST", value)?;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_env("PORT", value)?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(email) = lookup("ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
        Ok(())
    }

    /// Reject settings the service cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "security.jwt_secret (JWT_SECRET) must be set".into(),
            ));
        }
        if self.security.jwt_expire_secs <= 0 {
            return Err(ConfigError::Invalid(
                "security.jwt_expire_secs (JWT_EXPIRE) must be positive".into(),
            ));
        }
        if !(4..=31).contains(&self.security.password_cost) {
            return Err(ConfigError::Invalid(
                "security.password_cost (BCRYPT_COST) must be between 4 and 31".into(),
            ));
        }
        Ok(())
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.security.jwt_secret.clone(), self.security.jwt_expire_secs)
    }

    /// `None` means the in-memory repository should be used
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database.url.as_ref().map(|url| DatabaseConfig {
            url: url.clone(),
            max_connections: self.database.max_connections,
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_conventions() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.security.jwt_expire_secs, 3600);
        assert_eq!(cfg.security.password_cost, 10);
        assert!(cfg.database_config().is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [security]
            jwt_secret = "from-file"

            [database]
            url = "sqlite://./test.db?mode=rwc"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.security.jwt_secret, "from-file");
        assert_eq!(cfg.security.jwt_expire_secs, 3600);
        assert_eq!(
            cfg.database_config().unwrap().url,
            "sqlite://./test.db?mode=rwc"
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_from(env(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE", "900"),
            ("PORT", "7000"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]))
        .unwrap();

        assert_eq!(cfg.security.jwt_secret, "s3cret");
        assert_eq!(cfg.security.jwt_expire_secs, 900);
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(cfg.jwt_config().expiration_secs, 900);
    }

    #[test]
    fn malformed_env_value_is_reported() {
        let mut cfg = AppConfig::default();
        let err = cfg
            .apply_env_from(env(&[("JWT_EXPIRE", "an hour")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "JWT_EXPIRE", .. }));
    }

    #[test]
    fn missing_secret_fails_validation() {
        let mut cfg = AppConfig::default();
        assert!(cfg.validate().is_err());

        cfg.security.jwt_secret = "s3cret".into();
        assert!(cfg.validate().is_ok());

        cfg.security.password_cost = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut cfg = AppConfig::default();
        cfg.security.jwt_secret = "s3cret".into();
        cfg.admin.password = Some("admin-pass".into());

        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("admin-pass"));
    }
}
