//! Configuration module for chartdata-rs
//!
//! Settings for the series kernel, grouped by the component they tune:
//! - [`StoreSettings`] - window size for live (windowed) series
//! - [`BridgeSettings`] - cross-context query timeout and channel capacity
//! - [`AnalysisSettings`] - default anomaly threshold and trendline sampling
//!
//! # Files
//!
//! [`ChartDataConfig`] can be loaded from and saved to JSON or TOML. The
//! format follows the file extension (`.toml` for TOML, anything else is
//! JSON). Missing fields take their defaults.
//!
//! # Example
//!
//! ```ignore
//! use chartdata_rs::config::ChartDataConfig;
//!
//! let config = ChartDataConfig::load_or_default("chart.toml");
//! let store = SeriesStore::with_config(CartesianShape, &config.store);
//! ```

use crate::error::{ChartDataError, Result};
use crate::model::DEFAULT_MAX_WINDOW;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for cross-context queries in milliseconds
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 1000;

/// Default channel capacity for commands sent to the owning context
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// Default z-score threshold for anomaly detection
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

/// Default number of segments when sampling a trendline
pub const DEFAULT_TRENDLINE_STEPS: usize = 20;

/// On-disk format of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Series store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Maximum entries kept by windowed inserts
    #[serde(default = "default_max_window")]
    pub max_window: usize,
}

fn default_max_window() -> usize {
    DEFAULT_MAX_WINDOW
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

/// Cross-context bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// How long a blocking query waits for the owning context
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Capacity of the command channel
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT_MS
}

fn default_command_capacity() -> usize {
    DEFAULT_COMMAND_CAPACITY
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl BridgeSettings {
    /// Query timeout as a duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Analysis defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// z-score at or above which a sample is an anomaly
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,

    /// Segments used when sampling a non-linear trendline
    #[serde(default = "default_trendline_steps")]
    pub trendline_steps: usize,
}

fn default_anomaly_threshold() -> f64 {
    DEFAULT_ANOMALY_THRESHOLD
}

fn default_trendline_steps() -> usize {
    DEFAULT_TRENDLINE_STEPS
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            trendline_steps: DEFAULT_TRENDLINE_STEPS,
        }
    }
}

/// Complete kernel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl ChartDataConfig {
    /// Parse a config from a string in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ChartDataError::Config(format!("Failed to parse JSON config: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ChartDataError::Config(format!("Failed to parse TOML config: {}", e))),
        }
    }

    /// Serialize the config in the given format
    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| {
                ChartDataError::Config(format!("Failed to serialize config: {}", e))
            }),
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| {
                ChartDataError::Config(format!("Failed to serialize config: {}", e))
            }),
        }
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChartDataError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::parse(&content, ConfigFormat::from_path(path))?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load a config file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ChartDataError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.to_string_as(ConfigFormat::from_path(path))?;
        std::fs::write(path, content).map_err(|e| {
            ChartDataError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }
}
