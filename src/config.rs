//! Configuration management for the log vault

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::NoncePolicy;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the session and key tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where archives are written when no share target is available
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Maximum log entries kept in memory (default: 1000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum stored sessions; the oldest are pruned at session start (default: 10)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds between scheduled flushes (default: 5)
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Mirror every entry to the console sink
    #[serde(default)]
    pub console_mirroring: bool,

    /// Nonce handling for snapshots: "session" (default) or "per_write"
    #[serde(default)]
    pub nonce_policy: NoncePolicy,
}

fn default_data_dir() -> PathBuf {
    config_dir().join("data")
}

fn default_export_dir() -> PathBuf {
    config_dir().join("exports")
}

fn default_max_entries() -> usize {
    1000
}

fn default_max_sessions() -> usize {
    10
}

fn default_flush_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            max_entries: default_max_entries(),
            max_sessions: default_max_sessions(),
            flush_interval_secs: default_flush_interval_secs(),
            console_mirroring: false,
            nonce_policy: NoncePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }
}

/// Get the base configuration directory (~/.logvault)
/// Falls back to ./.logvault if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".logvault")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".logvault"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure the configuration directory exists
pub fn ensure_directories() -> Result<()> {
    std::fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    Ok(())
}
