/// Service configuration loader - parses surfsup.toml
///
/// Keeps deployment details (bind address, worker count, window length,
/// database location) out of the code. Every field has a default, so the
/// service runs without a config file as long as DATABASE_URL is set.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::DbConfigError;
use crate::handlers::{MAX_TRAILING_WINDOW_DAYS, TRAILING_WINDOW_DAYS};

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub window: WindowConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads; each in-flight request holds one connection.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workers: 4,
        }
    }
}

/// Store location. `url` falls back to DATABASE_URL when unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// Trailing window used by precipitation and tobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub trailing_days: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            trailing_days: TRAILING_WINDOW_DAYS,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid("server.workers must be >= 1".to_string()));
        }
        if !(1..=MAX_TRAILING_WINDOW_DAYS).contains(&self.window.trailing_days) {
            return Err(ConfigError::Invalid(format!(
                "window.trailing_days must be between 1 and {}, got {}",
                MAX_TRAILING_WINDOW_DAYS, self.window.trailing_days
            )));
        }
        Ok(())
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Database URL from the config file, else DATABASE_URL (after loading `.env`).
    pub fn database_url(&self) -> Result<String, DbConfigError> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }

        dotenv::dotenv().ok();
        std::env::var("DATABASE_URL").map_err(|_| DbConfigError::MissingDatabaseUrl)
    }
}

/// Loads configuration from `path`.
///
/// A missing file yields the defaults; an unreadable or malformed one is an
/// error, since silently ignoring it would serve with settings the operator
/// did not ask for.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => ServiceConfig::from_toml_str(&contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(ServiceConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
