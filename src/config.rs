//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::collaborators::SettingsStore;
use crate::error::{LoggerError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Session log output
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// User settings read at every start request
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SettingsConfig {
    #[serde(default)]
    pub log_location: bool,

    #[serde(default = "default_prefer_gps")]
    pub prefer_gps: bool,
}

/// Location update parameters and host provider availability
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LocationConfig {
    #[serde(default = "default_min_update_interval_ms")]
    pub min_update_interval_ms: u64,

    #[serde(default)]
    pub min_distance_m: f64,

    #[serde(default = "default_provider_enabled")]
    pub gps_enabled: bool,

    #[serde(default = "default_provider_enabled")]
    pub network_enabled: bool,
}

/// Diagnostic (tracing) output of the binary
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DiagnosticsConfig {
    /// Directory for daily-rolling diagnostic logs; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_level")]
    pub level: String,
}

// Default value functions
fn default_log_dir() -> String { "./logs".to_string() }

fn default_prefer_gps() -> bool { true }

fn default_min_update_interval_ms() -> u64 { 100 }
fn default_provider_enabled() -> bool { true }

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_dir: default_log_dir() }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            log_location: false,
            prefer_gps: default_prefer_gps(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            min_update_interval_ms: default_min_update_interval_ms(),
            min_distance_m: 0.0,
            gps_enabled: default_provider_enabled(),
            network_enabled: default_provider_enabled(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            level: default_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wheel_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty"));
        }

        if self.location.min_update_interval_ms == 0
            || self.location.min_update_interval_ms > 60000
        {
            return Err(invalid("min_update_interval_ms must be between 1 and 60000"));
        }

        if !self.location.min_distance_m.is_finite() || self.location.min_distance_m < 0.0 {
            return Err(invalid("min_distance_m must be a non-negative number"));
        }

        if matches!(&self.diagnostics.log_dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("diagnostics log_dir cannot be empty when set"));
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.diagnostics.level.to_ascii_lowercase().as_str())
        {
            return Err(invalid(
                "diagnostics level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> LoggerError {
    LoggerError::Config(toml::de::Error::custom(message))
}

/// [`SettingsStore`] backed by the `[settings]` table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TomlSettings(pub SettingsConfig);

impl SettingsStore for TomlSettings {
    fn log_location_enabled(&self) -> bool {
        self.0.log_location
    }

    fn prefer_gps(&self) -> bool {
        self.0.prefer_gps
    }
}
