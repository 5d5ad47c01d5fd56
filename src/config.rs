use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::map::DEFAULT_TILE_URL;

/// Top-level application configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub map: MapConfig,
    /// Optional replacement for the built-in region catalog (.yml/.yaml/.csv).
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            form: FormConfig::default(),
            map: MapConfig::default(),
            catalog: None,
            log_level: default_log_level(),
        }
    }
}

/// Where fault reports are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Form behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Refuse to submit until the map has been clicked.
    #[serde(default)]
    pub require_location: bool,
    /// Clear the form after the backend accepts a report.
    #[serde(default = "default_true")]
    pub reset_after_submit: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            require_location: false,
            reset_after_submit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: default_tile_url(),
        }
    }
}

/// Returns the faultreport config directory path (`~/.config/faultreport/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".config").join("faultreport"))
}

/// Returns the config file path (`~/.config/faultreport/config.toml`).
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config from `path`. Returns `Ok(None)` if the file does not exist.
pub fn load_config(path: &std::path::Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}
