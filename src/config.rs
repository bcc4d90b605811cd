//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TTL_SECS};
use crate::fetcher::DEFAULT_STEAM_API_BASE_URL;

/// Persistence backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Server-side Steam Web API key; a request header may override it
    pub steam_api_key: Option<String>,
    /// Steam Web API base URL
    pub steam_api_base_url: String,
    /// TTL in seconds for cached Steam snapshots
    pub cache_ttl: u64,
    /// Background cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound in seconds for a refresh triggered by a listing request
    pub refresh_deadline: u64,
    pub store_backend: StoreBackend,
    /// Connection URL for the SQLite backend
    pub database_url: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STEAM_API_KEY` - Steam Web API key (default: unset)
    /// - `STEAM_API_BASE_URL` - Steam Web API base URL (default: https://api.steampowered.com)
    /// - `CACHE_TTL` - Snapshot cache TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 300)
    /// - `REFRESH_DEADLINE` - Listing refresh deadline in seconds (default: 30)
    /// - `STORE_BACKEND` - `memory` or `sqlite` (default: memory)
    /// - `DATABASE_URL` - SQLite URL (default: sqlite://suspects.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
            steam_api_key: env::var("STEAM_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            steam_api_base_url: env::var("STEAM_API_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.steam_api_base_url),
            cache_ttl: parsed_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            cleanup_interval: parsed_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            refresh_deadline: parsed_var("REFRESH_DEADLINE").unwrap_or(defaults.refresh_deadline),
            store_backend: parsed_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        }
    }

    pub fn refresh_deadline(&self) -> Duration {
        Duration::from_secs(self.refresh_deadline)
    }
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            steam_api_key: None,
            steam_api_base_url: DEFAULT_STEAM_API_BASE_URL.to_string(),
            cache_ttl: DEFAULT_TTL_SECS,
            cleanup_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            refresh_deadline: 30,
            store_backend: StoreBackend::Memory,
            database_url: "sqlite://suspects.db".to_string(),
        }
    }
}
