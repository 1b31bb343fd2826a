//! Application configuration loaded from a TOML file.
//!
//! The default location is the platform config directory
//! (`.../shop-schedule/config.toml`). A missing file yields defaults so the
//! binary can start against a local backend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "SHOP_SCHEDULE_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Extra attempts for read calls; mutations are never retried.
    pub read_retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_secs: 20,
            read_retries: 2,
            retry_delay_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default config file path for this platform.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "shop-schedule")
            .context("Failed to determine config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or the default path when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            Self::from_toml(&raw).with_context(|| format!("Invalid config file {:?}", path))?
        } else {
            log::info!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse config TOML")
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            anyhow::bail!("api.base_url must be an http(s) URL, got '{}'", base);
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}
