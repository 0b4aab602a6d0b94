//! Configuration file handling.
//!
//! This module provides loading and saving of scanner defaults from a TOML
//! file. Command-line flags override every value read here.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/ssh-key-scanner/config.toml`
//! - macOS: `~/Library/Application Support/ssh-key-scanner/config.toml`
//! - Windows: `%APPDATA%\ssh-key-scanner\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! rate_limit = 100
//! concurrency = 50
//! timeout_secs = 5
//! port = 22
//! default_format = "table"
//! show_progress = false
//! show_summary = false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ScanError;
use crate::scanner::ScanSettings;

/// Application configuration.
///
/// Every field is optional in the file; missing keys take their defaults.
///
/// # Example
///
/// ```no_run
/// use ssh_key_scanner::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Rate limit: {} probes/s", config.rate_limit);
/// println!("Concurrency: {}", config.concurrency);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probe starts per second.
    ///
    /// Default: 100
    pub rate_limit: u32,

    /// Maximum number of probes in flight.
    ///
    /// Default: 50
    pub concurrency: usize,

    /// Per-probe connection and handshake timeout, in seconds.
    ///
    /// Default: 5
    pub timeout_secs: u64,

    /// TCP port probed on every address.
    ///
    /// Default: 22
    pub port: u16,

    /// Output format when no `--output-format` flag is provided.
    ///
    /// Valid values: "table", "json", "csv"
    /// Default: "table"
    pub default_format: String,

    /// Whether to draw a progress bar by default.
    pub show_progress: bool,

    /// Whether to print the scan summary table by default.
    pub show_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: ScanSettings::DEFAULT_RATE_LIMIT,
            concurrency: ScanSettings::DEFAULT_CONCURRENCY,
            timeout_secs: ScanSettings::DEFAULT_TIMEOUT.as_secs(),
            port: 22,
            default_format: "table".to_string(),
            show_progress: false,
            show_summary: false,
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Returns the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ssh-key-scanner")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the scheduler parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] for a zero rate limit, concurrency
    /// or timeout.
    pub fn scan_settings(&self) -> std::result::Result<ScanSettings, ScanError> {
        ScanSettings::new(self.rate_limit, self.concurrency, self.timeout())
    }
}
