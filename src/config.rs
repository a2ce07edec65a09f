//! Configuration file support for the adapter layer.
//!
//! The configuration selects which adapters the registry is built with and
//! carries the defensive limits used by detection and reads. It is read once
//! at process start, before the registry is built.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_CHUNK_BYTES, DEFAULT_MAX_IFD_ENTRIES, DEFAULT_MAX_IFD_OFFSET,
    MAX_IFD_ENTRIES_CEILING, MIN_IFD_OFFSET,
};

/// Log level setting for the adapter layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    #[default]
    Warn,
    /// Show errors, warnings, and info messages
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Bounds applied while parsing untrusted headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionLimits {
    /// Largest accepted offset of the first TIFF directory
    #[serde(default = "default_max_ifd_offset")]
    pub max_ifd_offset: u64,

    /// Largest accepted number of entries in one TIFF directory
    #[serde(default = "default_max_ifd_entries")]
    pub max_ifd_entries: u64,
}

fn default_max_ifd_offset() -> u64 {
    DEFAULT_MAX_IFD_OFFSET
}

fn default_max_ifd_entries() -> u64 {
    DEFAULT_MAX_IFD_ENTRIES
}

impl Default for DetectionLimits {
    fn default() -> Self {
        Self {
            max_ifd_offset: default_max_ifd_offset(),
            max_ifd_entries: default_max_ifd_entries(),
        }
    }
}

/// Bounds applied while reading data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadLimits {
    /// Ceiling on one decoded scanline or tile buffer
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,
}

fn default_max_chunk_bytes() -> usize {
    DEFAULT_MAX_CHUNK_BYTES
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_chunk_bytes: default_max_chunk_bytes(),
        }
    }
}

/// Adapter layer configuration that can be loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Header parsing limits
    #[serde(default)]
    pub detection: DetectionLimits,

    /// Data read limits
    #[serde(default)]
    pub read: ReadLimits,

    /// Ids of the adapters to register, in no particular order
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
}

fn default_enabled() -> Vec<String> {
    vec!["geotiff".to_string(), "cdf".to_string()]
}

impl AdapterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            detection: DetectionLimits::default(),
            read: ReadLimits::default(),
            enabled: default_enabled(),
        }
    }

    /// Whether an adapter id is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|e| e == id)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file and apply its log level.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        config.apply_log_level();
        log::info!("Loaded adapter configuration from {:?}", path);
        Ok(config)
    }

    /// Cap the `log` crate's global level at the configured verbosity. The
    /// host still installs the logger itself.
    pub fn apply_log_level(&self) {
        log::set_max_level(self.log_level.to_level_filter());
        log::debug!("Adapter log level set to {}", self.log_level.name());
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.max_ifd_offset < MIN_IFD_OFFSET {
            return Err(ConfigError::InvalidValue(format!(
                "detection.max_ifd_offset must be at least {}",
                MIN_IFD_OFFSET
            )));
        }
        if self.detection.max_ifd_entries == 0
            || self.detection.max_ifd_entries > MAX_IFD_ENTRIES_CEILING
        {
            return Err(ConfigError::InvalidValue(format!(
                "detection.max_ifd_entries must be in 1..={}",
                MAX_IFD_ENTRIES_CEILING
            )));
        }
        if self.read.max_chunk_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "read.max_chunk_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
