//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the tool's TOML
//! configuration: shared logging settings, the dictionary client, the drive
//! sequencer and the simulated bus.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ecat_common::config::{ConfigError, ConfigLoader, ToolConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ToolConfig::load(Path::new("tool.toml"))?;
//!     config.validate()?;
//!     println!("Driver: {}", config.client.driver);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_ACCESS_TIMEOUT_MS, DEFAULT_DRIVER, DEFAULT_JOURNAL_LIMIT, DEFAULT_MAX_STATUS_POLLS,
    DEFAULT_POLL_INTERVAL_MS, TOOL_SERVICE_NAME,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "ecat-bench-01"
/// log_json = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,

    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: TOOL_SERVICE_NAME.to_string(),
            log_json: false,
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dictionary client selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Registered client name.
    pub driver: String,
    /// Per-access timeout in milliseconds.
    pub access_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            access_timeout_ms: DEFAULT_ACCESS_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Per-access timeout.
    pub fn access_timeout(&self) -> Duration {
        Duration::from_millis(self.access_timeout_ms)
    }
}

/// Drive sequencer behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    /// Check the status word after each control word before continuing.
    pub verify_transitions: bool,
    /// Status reads per transition before giving up.
    pub max_status_polls: u32,
    /// Pause between status reads in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            verify_transitions: true,
            max_status_polls: DEFAULT_MAX_STATUS_POLLS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SequencerConfig {
    /// Pause between status reads.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// One simulated slave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimSlaveConfig {
    /// Ring position.
    pub position: u16,
    /// Station alias.
    #[serde(default)]
    pub alias: u16,
    /// Device name.
    #[serde(default = "default_slave_name")]
    pub name: String,
    /// Start in the fault state.
    #[serde(default)]
    pub initial_fault: bool,
    /// Simulated per-access latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_slave_name() -> String {
    "EPOS3".to_string()
}

/// Simulated bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master index the bus is attached to.
    pub master: u32,
    /// Slaves on the bus.
    pub slaves: Vec<SimSlaveConfig>,
    /// Most recent accesses kept in the journal; 0 disables it.
    pub journal_limit: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            master: 0,
            slaves: vec![SimSlaveConfig {
                position: 0,
                alias: 0,
                name: default_slave_name(),
                initial_fault: false,
                latency_ms: 0,
            }],
            journal_limit: DEFAULT_JOURNAL_LIMIT,
        }
    }
}

/// Full tool configuration (`tool.toml`).
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Logging and identity.
    pub shared: SharedConfig,
    /// Dictionary client.
    pub client: ClientConfig,
    /// Drive sequencer.
    pub sequencer: SequencerConfig,
    /// Simulated bus (used by the `simulation` client).
    pub simulation: SimulationConfig,
}

impl ToolConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.client.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "client.driver cannot be empty".to_string(),
            ));
        }
        if self.client.access_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "client.access_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.sequencer.verify_transitions && self.sequencer.max_status_polls == 0 {
            return Err(ConfigError::ValidationError(
                "sequencer.max_status_polls must be > 0 when verify_transitions is set"
                    .to_string(),
            ));
        }

        let mut positions = HashSet::new();
        for slave in &self.simulation.slaves {
            if !positions.insert(slave.position) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate simulated slave position {}",
                    slave.position
                )));
            }
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed = TestWrapper::parse(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            service_name: String::new(),
            ..SharedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ToolConfig::parse("").unwrap();
        assert_eq!(config.client.driver, DEFAULT_DRIVER);
        assert_eq!(config.client.access_timeout(), Duration::from_millis(1000));
        assert!(config.sequencer.verify_transitions);
        assert_eq!(config.simulation.slaves.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ToolConfig::parse("[client]\ndriver = \"simulation\"\nbogus = 1\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ToolConfig::parse("[client]\naccess_timeout_ms = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_duplicate_slave_positions_rejected() {
        let config = ToolConfig::parse(
            r#"
[[simulation.slaves]]
position = 0

[[simulation.slaves]]
position = 0
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
