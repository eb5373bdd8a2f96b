use crate::constants::{DEFAULT_PORT, TRANSFER_BUFFER_SIZE};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub passive_mode: bool,
    pub local_charset: Option<String>, // Both charsets must be set to take effect
    pub server_charset: Option<String>,
    pub transfer_buffer_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: DEFAULT_PORT,
            username: String::from("anonymous"),
            password: String::from("anonymous@"),
            passive_mode: true,
            local_charset: None,
            server_charset: None,
            transfer_buffer_size: Some(TRANSFER_BUFFER_SIZE),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        Ok(config)
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config = Config::from_toml(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}

// Helper function to log configuration options
pub fn log_config(config: &ClientConfig) {
    info!("  Host: {}:{}", config.host, config.port);
    info!("  Username: {}", config.username);
    info!(
        "  Transfer Mode: {}",
        if config.passive_mode { "passive" } else { "active" }
    );
    if let (Some(local), Some(server)) = (&config.local_charset, &config.server_charset) {
        info!("  Charsets: {} -> {}", local, server);
    }
    info!(
        "  Transfer Buffer Size: {} KB",
        config.transfer_buffer_size.unwrap_or(TRANSFER_BUFFER_SIZE) / 1024
    );
}
