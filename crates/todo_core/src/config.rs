//! Runtime configuration for the todo core.
//!
//! # Responsibility
//! - Collect storage location, storage key, latency bounds and log level.
//! - Load overrides from `TODO_APP_*` environment variables.
//!
//! # Invariants
//! - `latency_min_ms <= latency_max_ms` after `validate()`.
//! - `storage_key` is never blank after `validate()`.

use crate::api::latency::UniformLatency;
use crate::logging::LogLevel;
use crate::storage::DEFAULT_STORAGE_KEY;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TODO_APP_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "TODO_APP_STORAGE_KEY";
pub const ENV_LATENCY_MIN_MS: &str = "TODO_APP_LATENCY_MIN_MS";
pub const ENV_LATENCY_MAX_MS: &str = "TODO_APP_LATENCY_MAX_MS";
pub const ENV_LOG_LEVEL: &str = "TODO_APP_LOG_LEVEL";

pub const DEFAULT_LATENCY_MIN_MS: u64 = 200;
pub const DEFAULT_LATENCY_MAX_MS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidLatencyRange { min_ms: u64, max_ms: u64 },
    EmptyStorageKey,
    UnsupportedLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a non-negative integer, got `{value}`")
            }
            Self::InvalidLatencyRange { min_ms, max_ms } => write!(
                f,
                "latency lower bound {min_ms}ms exceeds upper bound {max_ms}ms"
            ),
            Self::EmptyStorageKey => write!(f, "storage key cannot be empty"),
            Self::UnsupportedLogLevel(level) => write!(f, "unsupported log level `{level}`"),
        }
    }
}

impl Error for ConfigError {}

/// Application configuration shared by the bridge and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file backing local storage. `None` runs without durability.
    pub db_path: Option<PathBuf>,
    pub storage_key: String,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            latency_min_ms: DEFAULT_LATENCY_MIN_MS,
            latency_max_ms: DEFAULT_LATENCY_MAX_MS,
            log_level: LogLevel::build_default().as_str().to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from process environment on top of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Blank values are ignored and keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(key) = value(ENV_STORAGE_KEY) {
            config.storage_key = key;
        }
        if let Some(raw) = value(ENV_LATENCY_MIN_MS) {
            config.latency_min_ms = parse_millis(ENV_LATENCY_MIN_MS, raw)?;
        }
        if let Some(raw) = value(ENV_LATENCY_MAX_MS) {
            config.latency_max_ms = parse_millis(ENV_LATENCY_MAX_MS, raw)?;
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(ConfigError::InvalidLatencyRange {
                min_ms: self.latency_min_ms,
                max_ms: self.latency_max_ms,
            });
        }
        if LogLevel::parse(&self.log_level).is_err() {
            return Err(ConfigError::UnsupportedLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    /// Builds the latency policy described by this config.
    pub fn latency_policy(&self) -> UniformLatency {
        UniformLatency::new(self.latency_min_ms, self.latency_max_ms)
    }
}

fn parse_millis(key: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
}
