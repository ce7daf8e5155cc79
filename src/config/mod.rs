use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// host:port the relay listens on.
    pub bind_addr: String,
    /// Connections beyond this count are refused at accept time.
    pub max_connections: usize,
    /// Hard cap on a single wire frame; larger frames drop the connection.
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9800".to_string(),
            max_connections: 1024,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Capacity of each subscriber's outbound frame queue.
    pub queue_capacity: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self { queue_capacity: 256 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub delivery: DeliveryConfig,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}

/// Process-wide configuration.
///
/// Reads the path from `CHATRELAY_CONFIG` (default `chatrelay.toml`); if the
/// file is missing or malformed the built-in defaults are used.
pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    let path = std::env::var("CHATRELAY_CONFIG").unwrap_or_else(|_| "chatrelay.toml".to_string());
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("could not load config from {path}: {e}; using defaults");
            Config::default()
        }
    }
});
