//! Configuration management for bkt.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/bkt/config.toml`
//! - **Windows**: `%APPDATA%\bkt\config.toml`
//!
//! Credentials never live in this file; the client reads them from the
//! environment.
//!
//! # Example
//!
//! ```ignore
//! use bkt_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("bitbucket.workspace", "acme")?;
//! config.set("bitbucket.repo", "widgets")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "bkt";

/// Default Bitbucket Cloud API root.
pub const DEFAULT_BITBUCKET_URL: &str = "https://api.bitbucket.org/2.0";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bitbucket Cloud configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketConfig>,
}

/// Bitbucket Cloud configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitbucketConfig {
    /// API root URL
    #[serde(default = "default_bitbucket_url")]
    pub base_url: String,
    /// Default workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Default repository slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Username for app-password authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for BitbucketConfig {
    fn default() -> Self {
        Self {
            base_url: default_bitbucket_url(),
            workspace: None,
            repo: None,
            username: None,
        }
    }
}

fn default_bitbucket_url() -> String {
    DEFAULT_BITBUCKET_URL.to_string()
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Bitbucket section, or defaults when it is missing.
    pub fn bitbucket_or_default(&self) -> BitbucketConfig {
        self.bitbucket.clone().unwrap_or_default()
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `bitbucket.field` (e.g., `bitbucket.workspace`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let field = parse_key(key)?;
        let config = self.bitbucket.get_or_insert_with(BitbucketConfig::default);

        match field {
            "base_url" | "url" => config.base_url = value.to_string(),
            "workspace" => config.workspace = Some(value.to_string()),
            "repo" | "repository" => config.repo = Some(value.to_string()),
            "username" | "user" => config.username = Some(value.to_string()),
            _ => {
                return Err(Error::Config(format!(
                    "Unknown Bitbucket config field: {}",
                    field
                )))
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `bitbucket.field` (e.g., `bitbucket.workspace`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let field = parse_key(key)?;
        let Some(config) = &self.bitbucket else {
            return Ok(None);
        };

        match field {
            "base_url" | "url" => Ok(Some(config.base_url.clone())),
            "workspace" => Ok(config.workspace.clone()),
            "repo" | "repository" => Ok(config.repo.clone()),
            "username" | "user" => Ok(config.username.clone()),
            _ => Err(Error::Config(format!(
                "Unknown Bitbucket config field: {}",
                field
            ))),
        }
    }
}

/// Split `provider.field` and check the provider.
fn parse_key(key: &str) -> Result<&str> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: provider.field",
            key
        )));
    }

    match parts[0] {
        "bitbucket" => Ok(parts[1]),
        provider => Err(Error::Config(format!("Unknown provider: {}", provider))),
    }
}

// =============================================================================
// Tests
// =============================================================================
