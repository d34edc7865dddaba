//! Environment configuration, read once at startup.

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown backend {0:?}; expected \"memory\" or \"mongodb\"")]
    UnknownBackend(String),
}

/// Which storage engine backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    MongoDb,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    pub backend: BackendKind,
    pub mongodb_url: String,
    pub database_name: String,
}

impl Config {
    /// Reads configuration from the environment, falling back to development
    /// defaults for anything unset. An unrecognized backend name is a startup
    /// error, not a silent default.
    pub fn from_env() -> Result<Config, ConfigError> {
        let backend = match env::var("ROSTER_BACKEND")
            .unwrap_or_else(|_| "mongodb".to_string())
            .as_str()
        {
            "memory" => BackendKind::Memory,
            "mongodb" => BackendKind::MongoDb,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Config {
            bind_addr: env::var("ROSTER_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            backend,
            mongodb_url: env::var("MONGODB_URL")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "roster".to_string()),
        })
    }
}
