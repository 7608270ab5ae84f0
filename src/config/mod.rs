//! Configuration system for FindAFriend
//!
//! Supports loading configuration from:
//! 1. CLI --config argument
//! 2. ~/.config/findafriend/config.{FINDAFRIEND_ENV}.json
//! 3. Default values
//!
//! Where FINDAFRIEND_ENV can be: production (default), development, test
//!
//! # Examples
//!
//! ```no_run
//! use findafriend::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! println!("Groups of {}..{}", config.grouping.min_size, config.grouping.max_size);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variables
//!
//! Environment variables override config file values:
//! - FINDAFRIEND_DB
//! - FINDAFRIEND_MIN_SIZE
//! - FINDAFRIEND_MAX_SIZE
//! - FINDAFRIEND_INTERVAL_SECS

use crate::grouping::assigner::{DEFAULT_MIN_BATCH, DEFAULT_RESPONDENTS_PER_CLUSTER};
use crate::grouping::rebalancer::{DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE};
use crate::grouping::RosterWriteMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Grouping engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Smallest acceptable group
    #[serde(default = "default_min_size")]
    pub min_size: usize,

    /// Largest acceptable group
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Fewer respondents than this and the run is skipped
    #[serde(default = "default_min_batch")]
    pub min_batch: usize,

    /// Target cluster count is respondents / this
    #[serde(default = "default_respondents_per_group")]
    pub respondents_per_group: usize,

    /// Seed for rebalancing choices; unseeded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

fn default_min_size() -> usize {
    DEFAULT_MIN_SIZE
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_min_batch() -> usize {
    DEFAULT_MIN_BATCH
}

fn default_respondents_per_group() -> usize {
    DEFAULT_RESPONDENTS_PER_CLUSTER
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
            min_batch: default_min_batch(),
            respondents_per_group: default_respondents_per_group(),
            rng_seed: None,
        }
    }
}

impl GroupingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_size == 0 || self.max_size == 0 {
            return Err(ConfigError::ValidationError(
                "min_size and max_size must be greater than 0".to_string(),
            ));
        }

        if self.min_size > self.max_size {
            return Err(ConfigError::ValidationError(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }

        if self.min_batch == 0 {
            return Err(ConfigError::ValidationError(
                "min_batch must be greater than 0".to_string(),
            ));
        }

        if self.respondents_per_group == 0 {
            return Err(ConfigError::ValidationError(
                "respondents_per_group must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Periodic grouping runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between runs
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run once immediately when the scheduler starts
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

fn default_interval() -> u64 {
    24 * 60 * 60
}

fn default_run_on_start() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            run_on_start: default_run_on_start(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database path (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Whether a run replaces or extends the stored groups
    #[serde(default)]
    pub roster_mode: RosterWriteMode,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration with standard priority:
    /// 1. Explicit path
    /// 2. ~/.config/findafriend/config.{FINDAFRIEND_ENV}.json
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if path.exists() {
                tracing::info!("Loading config from: {:?}", path);
                return Self::from_file(path);
            } else {
                return Err(ConfigError::ValidationError(format!(
                    "Config file not found: {:?}",
                    path
                )));
            }
        }

        let env = std::env::var("FINDAFRIEND_ENV").unwrap_or_else(|_| "production".to_string());

        if let Some(config_dir) = Self::config_dir() {
            let config_path = config_dir.join(format!("config.{}.json", env));

            if config_path.exists() {
                tracing::info!("Loading config from: {:?}", config_path);
                return Self::from_file(&config_path);
            }
        }

        tracing::info!("Using default configuration with environment overrides");
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("FINDAFRIEND_DB") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(size) = env_number("FINDAFRIEND_MIN_SIZE")? {
            self.grouping.min_size = size as usize;
        }

        if let Some(size) = env_number("FINDAFRIEND_MAX_SIZE")? {
            self.grouping.max_size = size as usize;
        }

        if let Some(secs) = env_number("FINDAFRIEND_INTERVAL_SECS")? {
            self.schedule.interval_secs = secs;
        }

        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grouping.validate()?;

        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("findafriend"))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn env_number(name: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            ConfigError::ValidationError(format!("{} must be a number, got '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
