use crate::core::{
    ImageDimensions, DEFAULT_PASSES_PER_CYCLE, DEFAULT_REFRESH_INTERVAL_MS,
    MAX_PASSES_PER_CYCLE, MAX_REFRESH_INTERVAL_MS, MIN_REFRESH_INTERVAL_MS,
};
use crate::hardware::{ScannerBackend, ScannerSettings};
use crate::processing::{SignalModel, SignalModelError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the locator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Access point survey written by the floor-plan marker
    pub survey_path: String,
    /// Pixel dimensions of the floor plan
    pub image: ImageDimensions,
    /// Scan passes aggregated per refresh
    pub passes: usize,
    /// Time between refreshes (milliseconds)
    pub refresh_interval_ms: u64,
    /// Stop after this many ticks, run until stopped if unset
    pub max_ticks: Option<u64>,
    /// RSSI to weight strategy
    pub signal_model: SignalModel,
    /// Anchors whose weight is not above this are ignored
    pub min_weight: f64,
    /// Only consider access points broadcasting this SSID
    pub ssid_filter: Option<String>,
    pub scanner: ScannerSettings,
    pub log_level: LogLevel,
}

/// Logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    None,
    /// Error messages only
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and info messages
    Info,
    /// All messages including debug
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Missing required parameter
    MissingParameter { parameter: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid value for {}: {} ({})", parameter, value, reason)
            }
            ConfigError::MissingParameter { parameter } => {
                write!(f, "Missing required parameter: {}", parameter)
            }
            ConfigError::IoError { message } => write!(f, "Configuration I/O error: {}", message),
            ConfigError::SerializationError { message } => {
                write!(f, "Configuration format error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<SignalModelError> for ConfigError {
    fn from(error: SignalModelError) -> Self {
        match error {
            SignalModelError::InvalidParameter { parameter, value, reason } => {
                ConfigError::InvalidParameter {
                    parameter: format!("signal_model.{}", parameter),
                    value,
                    reason,
                }
            }
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            survey_path: "ap_locations.json".to_string(),
            image: ImageDimensions::default(),
            passes: DEFAULT_PASSES_PER_CYCLE,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            max_ticks: None,
            signal_model: SignalModel::default(),
            min_weight: 0.0,
            ssid_filter: None,
            scanner: ScannerSettings::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LocatorConfig {
    /// Load and validate configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError {
                message: e.to_string(),
            })?;

        let config: LocatorConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::SerializationError {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_json()?;

        fs::write(path, content)
            .map_err(|e| ConfigError::IoError {
                message: e.to_string(),
            })
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationError {
                message: e.to_string(),
            })
    }

    /// Check every parameter, reporting the first invalid one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.survey_path.trim().is_empty() {
            return Err(ConfigError::MissingParameter {
                parameter: "survey_path".to_string(),
            });
        }

        if !self.image.is_valid() {
            return Err(ConfigError::InvalidParameter {
                parameter: "image".to_string(),
                value: format!("{}x{}", self.image.width, self.image.height),
                reason: "Image dimensions must be positive".to_string(),
            });
        }

        if self.passes == 0 || self.passes > MAX_PASSES_PER_CYCLE {
            return Err(ConfigError::InvalidParameter {
                parameter: "passes".to_string(),
                value: self.passes.to_string(),
                reason: format!("Must be between 1 and {}", MAX_PASSES_PER_CYCLE),
            });
        }

        if !(MIN_REFRESH_INTERVAL_MS..=MAX_REFRESH_INTERVAL_MS).contains(&self.refresh_interval_ms) {
            return Err(ConfigError::InvalidParameter {
                parameter: "refresh_interval_ms".to_string(),
                value: self.refresh_interval_ms.to_string(),
                reason: format!(
                    "Must be between {} and {} ms",
                    MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS
                ),
            });
        }

        if self.max_ticks == Some(0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_ticks".to_string(),
                value: "0".to_string(),
                reason: "Omit the limit to run until stopped".to_string(),
            });
        }

        if !self.min_weight.is_finite() || self.min_weight < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "min_weight".to_string(),
                value: self.min_weight.to_string(),
                reason: "Must be a finite, non-negative number".to_string(),
            });
        }

        self.signal_model.validate()?;

        match self.scanner.backend {
            ScannerBackend::Iw if self.scanner.interface.trim().is_empty() => {
                Err(ConfigError::MissingParameter {
                    parameter: "scanner.interface".to_string(),
                })
            }
            ScannerBackend::Replay if self.scanner.replay_path.is_none() => {
                Err(ConfigError::MissingParameter {
                    parameter: "scanner.replay_path".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
