//! Configuration management for Solstat
//!
//! This module handles loading, validation, and management of the daemon
//! configuration from YAML files with environment overrides for secrets.

use crate::error::{Result, SolstatError};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "SOLSTAT_CONFIG";

/// Upper bound for the poll and retention cadences (30 days)
pub const MAX_INTERVAL_SECONDS: i64 = 30 * 86_400;

/// Where the latest status sample comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Read the most recent record from the historical store
    Store,
    /// Fetch from the vendor cloud API and append to the store
    Vendor,
}

/// Indicator output driver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorBackend {
    /// Linux sysfs GPIO (`/sys/class/gpio`)
    Sysfs,
    /// No hardware; state changes are only logged
    Log,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Status sample origin
    pub source: SourceKind,

    /// Seconds between reconciliation cycles
    pub poll_interval_seconds: u64,

    /// Timezone used when rendering times in logs
    pub timezone: String,

    /// Historical record store
    pub store: StoreConfig,

    /// Weather API parameters
    pub weather: WeatherConfig,

    /// Vendor (Enphase) API parameters
    pub vendor: VendorConfig,

    /// Health classification thresholds
    pub health: HealthConfig,

    /// Historical record pruning
    pub retention: RetentionConfig,

    /// Indicator lamp wiring
    pub indicators: IndicatorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Historical store connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path
    pub path: String,

    /// How long to wait for the store before treating it as unreachable
    pub connect_timeout_ms: u64,
}

/// OpenWeatherMap parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// API key (`appid`)
    pub api_key: String,

    /// Location code, e.g. `94040,us`
    pub location: String,

    /// Units system (standard, metric, imperial)
    pub units: String,

    /// Current-weather endpoint
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout_ms: u64,

    /// Total attempts per cycle, including the first
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles after each failure
    pub backoff_base_ms: u64,

    /// Wait after a rate-limit response before trying again
    pub rate_limit_backoff_seconds: u64,
}

/// Enphase Enlighten v2 parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Application key
    pub api_key: String,

    /// Enlighten user id
    pub user_id: String,

    /// System id of the array
    pub system_id: String,

    /// Per-request timeout
    pub request_timeout_ms: u64,
}

/// Health classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Reports older than this are considered delayed
    pub staleness_threshold_seconds: i64,
}

/// Pruning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Records older than this are deleted
    pub window_seconds: i64,

    /// Time between pruning runs
    pub interval_seconds: i64,
}

/// BCM pin numbers for each lamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub blue: u32,
    pub green: u32,
    pub red: u32,
    pub amber: u32,
}

/// Indicator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Output driver
    pub backend: IndicatorBackend,

    /// sysfs GPIO root
    pub gpio_root: String,

    /// Pin assignment
    pub pins: PinConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first location that exists
    pub fn load() -> Result<Self> {
        let mut candidates: Vec<String> = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            if !explicit.trim().is_empty() {
                if !Path::new(&explicit).exists() {
                    return Err(SolstatError::config(format!(
                        "{} points to missing file {}",
                        CONFIG_PATH_ENV, explicit
                    )));
                }
                candidates.push(explicit);
            }
        }
        candidates.extend(
            ["solstat.yaml", "/data/solstat.yaml", "/etc/solstat/config.yaml"]
                .iter()
                .map(|p| p.to_string()),
        );

        let mut config = match candidates.iter().find(|p| Path::new(p).exists()) {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Overlay API secrets from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay API secrets using an arbitrary lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("SOLSTAT_WEATHER_API_KEY") {
            self.weather.api_key = v;
        }
        if let Some(v) = non_empty("SOLSTAT_VENDOR_API_KEY") {
            self.vendor.api_key = v;
        }
        if let Some(v) = non_empty("SOLSTAT_VENDOR_USER_ID") {
            self.vendor.user_id = v;
        }
    }

    /// Parsed display timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            SolstatError::validation("timezone".to_string(), format!("{}", e))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            return Err(SolstatError::validation(
                "poll_interval_seconds",
                "Must be greater than 0",
            ));
        }
        if self.poll_interval_seconds > MAX_INTERVAL_SECONDS as u64 {
            return Err(SolstatError::validation(
                "poll_interval_seconds",
                "Must not exceed 30 days",
            ));
        }

        self.tz()?;

        if self.store.path.trim().is_empty() {
            return Err(SolstatError::validation(
                "store.path",
                "Store path cannot be empty",
            ));
        }

        if self.weather.api_key.trim().is_empty() {
            return Err(SolstatError::validation(
                "weather.api_key",
                "API key cannot be empty",
            ));
        }

        if self.weather.location.trim().is_empty() {
            return Err(SolstatError::validation(
                "weather.location",
                "Location cannot be empty",
            ));
        }

        if self.weather.max_attempts == 0 {
            return Err(SolstatError::validation(
                "weather.max_attempts",
                "Must be at least 1",
            ));
        }

        if self.source == SourceKind::Vendor {
            for (field, value) in [
                ("vendor.api_key", &self.vendor.api_key),
                ("vendor.user_id", &self.vendor.user_id),
                ("vendor.system_id", &self.vendor.system_id),
            ] {
                if value.trim().is_empty() {
                    return Err(SolstatError::validation(
                        field,
                        "Required when source is vendor",
                    ));
                }
            }
        }

        if self.health.staleness_threshold_seconds <= 0 {
            return Err(SolstatError::validation(
                "health.staleness_threshold_seconds",
                "Must be positive",
            ));
        }

        if self.retention.window_seconds <= 0 {
            return Err(SolstatError::validation(
                "retention.window_seconds",
                "Must be positive",
            ));
        }

        if self.retention.interval_seconds <= 0 {
            return Err(SolstatError::validation(
                "retention.interval_seconds",
                "Must be positive",
            ));
        }
        if self.retention.interval_seconds > MAX_INTERVAL_SECONDS {
            return Err(SolstatError::validation(
                "retention.interval_seconds",
                "Must not exceed 30 days",
            ));
        }

        let pins = &self.indicators.pins;
        let unique: HashSet<u32> = [pins.blue, pins.green, pins.red, pins.amber]
            .into_iter()
            .collect();
        if unique.len() != 4 {
            return Err(SolstatError::validation(
                "indicators.pins",
                "Each indicator needs its own pin",
            ));
        }

        Ok(())
    }
}
