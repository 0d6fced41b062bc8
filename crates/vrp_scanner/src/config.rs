//! Scanner configuration management.
//!
//! Handles loading the scanner configuration from TOML files with
//! environment variable override support.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use vrp_core::realized::DEFAULT_RV_WINDOW;
use vrp_core::types::{Instrument, IvSource};
use vrp_feeds::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

use crate::scan::ScanSettings;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/scanner.toml";

/// Configuration error type
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown provider name
    #[error("Unknown provider '{0}'. Valid values: synthetic, csv")]
    UnknownProvider(String),

    /// Validation error
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Market data provider backing a scan
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Seeded synthetic data, no files needed
    #[default]
    Synthetic,
    /// CSV snapshots under `data_dir`
    Csv,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synthetic" => Ok(Self::Synthetic),
            "csv" => Ok(Self::Csv),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Rate-limit retry settings
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, the first included
    pub max_attempts: u32,
    /// Seconds between attempts
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_secs: 10,
        }
    }
}

impl RetryConfig {
    /// Retry policy for the feeds
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

/// Scanner configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Realised volatility window, in periods
    pub rv_window: usize,

    /// Data directory for the CSV provider
    pub data_dir: PathBuf,

    /// History file
    pub history_path: PathBuf,

    /// Market data provider
    pub provider: ProviderKind,

    /// Seed for the synthetic provider
    pub seed: u64,

    /// Scan instruments concurrently
    pub parallel: bool,

    /// Attach VRP over time to the report
    pub include_series: bool,

    /// Rate-limit retry settings
    pub retry: RetryConfig,

    /// Log level
    pub log_level: String,

    /// Instruments to scan, in report order
    pub watchlist: Vec<Instrument>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rv_window: DEFAULT_RV_WINDOW,
            data_dir: PathBuf::from("data"),
            history_path: PathBuf::from("data/vrp_history.csv"),
            provider: ProviderKind::default(),
            seed: 42,
            parallel: true,
            include_series: false,
            retry: RetryConfig::default(),
            log_level: "info".to_string(),
            watchlist: Instrument::default_watchlist(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from the default path or return the default config
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load `path`, or the default config if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply environment variable overrides
    pub fn with_env_override(mut self) -> Self {
        if let Ok(window) = std::env::var("VRP_RV_WINDOW") {
            if let Ok(window) = window.parse() {
                self.rv_window = window;
            }
        }

        if let Ok(data_dir) = std::env::var("VRP_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(history_path) = std::env::var("VRP_HISTORY_PATH") {
            self.history_path = PathBuf::from(history_path);
        }

        if let Ok(log_level) = std::env::var("VRP_LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Ok(provider) = std::env::var("VRP_PROVIDER") {
            self.provider = provider.parse().unwrap_or(self.provider);
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if self.rv_window < 2 {
            errors.push(format!(
                "rv_window must be at least 2, got {}",
                self.rv_window
            ));
        }

        if self.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be greater than 0".to_string());
        }

        if self.provider == ProviderKind::Csv && self.data_dir.as_os_str().is_empty() {
            errors.push("data_dir cannot be empty for the csv provider".to_string());
        }

        if self.watchlist.is_empty() {
            errors.push("watchlist cannot be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for instrument in &self.watchlist {
            if instrument.symbol.trim().is_empty() {
                errors.push("watchlist contains an empty symbol".to_string());
            } else if !seen.insert(instrument.symbol.as_str()) {
                errors.push(format!("duplicate symbol '{}' in watchlist", instrument.symbol));
            }
            if let IvSource::OptionChain { band } = instrument.iv_source {
                if !(band.is_finite() && band > 0.0) {
                    errors.push(format!(
                        "option chain band for '{}' must be positive, got {}",
                        instrument.symbol, band
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Scan settings for a scan dated `as_of`
    pub fn scan_settings(&self, as_of: NaiveDate) -> ScanSettings {
        ScanSettings {
            as_of,
            rv_window: self.rv_window,
            parallel: self.parallel,
            include_series: self.include_series,
        }
    }
}
