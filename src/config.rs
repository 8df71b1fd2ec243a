//! Server configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, the process
//! environment (after loading a `.env` file if one exists), CLI flags.
//!
//! | Variable          | Field          | Default              |
//! |-------------------|----------------|----------------------|
//! | `PORT`            | `port`         | `5000`               |
//! | `TRACKER_BIND`    | `bind_address` | `127.0.0.1`          |
//! | `TRACKER_DB_PATH` | `db_path`      | `project-tracker.db` |
//! | `TRACKER_ENV`     | `graphiql`     | on when `development`|

use crate::error::{Result, TrackerError};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_DB_FILE: &str = "project-tracker.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Use a throwaway in-memory store instead of `db_path`
    pub in_memory: bool,
    /// Serve the GraphiQL IDE on `GET /graphql`
    pub graphiql: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            in_memory: false,
            graphiql: false,
        }
    }
}

impl ServerConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| {
                TrackerError::InvalidInput(format!("PORT must be a port number, got '{}'", port))
            })?;
        }

        if let Some(bind) = lookup("TRACKER_BIND").filter(|b| !b.is_empty()) {
            config.bind_address = bind;
        }

        if let Some(path) = lookup("TRACKER_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        config.graphiql = lookup("TRACKER_ENV").as_deref() == Some("development");

        Ok(config)
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
