//! Server configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Simulation cadence in milliseconds
    pub tick_interval_ms: u64,
    /// Buffered messages per WebSocket subscriber before it starts lagging
    pub broadcast_capacity: usize,
    /// SQLite launch log; `None` disables persistence
    pub database_path: Option<String>,
    pub database_max_connections: u32,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            tick_interval_ms: 2000,
            broadcast_capacity: 256,
            database_path: Some("data/gmd.db".to_string()),
            database_max_connections: 5,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_env("GMD_PORT").unwrap_or(defaults.server_port),
            tick_interval_ms: parse_env("GMD_TICK_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.tick_interval_ms),
            broadcast_capacity: parse_env("GMD_BROADCAST_CAPACITY")
                .filter(|cap| *cap > 0)
                .unwrap_or(defaults.broadcast_capacity),
            database_path: match env::var("GMD_DATABASE_PATH") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(path),
                Err(_) => defaults.database_path,
            },
            database_max_connections: parse_env("GMD_DATABASE_MAX_CONNECTIONS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.database_max_connections),
            log_json: env::var("GMD_LOG_JSON")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.log_json),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
