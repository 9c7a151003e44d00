//! Server configuration module.
//!
//! ## Sources (later wins)
//! ```text
//! built-in defaults
//!      │
//!      ▼
//! config/cantina.toml          (optional)
//!      │
//!      ▼
//! CANTINA__BIND_ADDR=...       (environment, `__` separator)
//! ```

use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use cantina_db::DbConfig;

/// Optional configuration file, without extension.
pub const CONFIG_FILE: &str = "config/cantina";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_PATH: &str = "./cantina.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_OPERATOR: &str = "caixa";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a sale or adjustment waits for the write lock
    pub lock_timeout_ms: u64,

    /// Default tracing directive when RUST_LOG is unset
    pub log_level: String,

    /// Operator recorded when a request carries no X-Operator header
    pub default_operator: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            default_operator: DEFAULT_OPERATOR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the default file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(File::with_name(CONFIG_FILE).required(false))
    }

    /// Loads configuration with `file` in place of the default file.
    pub fn load_with<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let config: ServerConfig = Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .set_default("lock_timeout_ms", DEFAULT_LOCK_TIMEOUT_MS as i64)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default("default_operator", DEFAULT_OPERATOR)?
            .add_source(file)
            .add_source(Environment::with_prefix("CANTINA").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the deserializer cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("lock_timeout_ms".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.default_operator.trim().is_empty() {
            return Err(ConfigError::MissingRequired("default_operator".to_string()));
        }

        Ok(())
    }

    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .lock_timeout(Duration::from_millis(self.lock_timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
