//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API base URL, request timeout, retry limit, and optional overrides for the
//! cache, data and seed directories.
//!
//! Configuration is stored at `~/.config/disability-advocacy/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_BASE_URL;
use crate::api::ClientSettings;

/// Application name used for the config directory path
const APP_NAME: &str = "disability-advocacy";

/// Folder created under the platform cache and documents directories
const APP_FOLDER: &str = "DisabilityAdvocacy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Structured store database file name
const DATABASE_FILE: &str = "advocacy.db";

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "ADVOCATE_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retry_attempts: u32,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub seed_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = ClientSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: defaults.timeout.as_secs(),
            max_retry_attempts: defaults.max_retry_attempts,
            data_dir: None,
            cache_dir: None,
            seed_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url.trim().to_string();
            }
        }
        self
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding one file per cache key.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_FOLDER))
    }

    /// Writable directory for collection files and the structured store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::document_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not find documents directory"))?;
        Ok(base.join(APP_FOLDER))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DATABASE_FILE))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retry_attempts: self.max_retry_attempts,
            ..ClientSettings::default()
        }
    }
}
