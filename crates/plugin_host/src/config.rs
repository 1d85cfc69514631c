//! Configuration management for the plugin host.
//!
//! Settings are plain serde structures that can be built in code or loaded
//! from a TOML file. Every section and field has a default, so an empty file
//! is a valid configuration.

use crate::error::{PluginHostError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Host configuration loaded from a TOML file.
///
/// ```toml
/// [manager]
/// catch_panics = true
/// warn_unhandled = false
///
/// [logging]
/// level = "debug"
/// json_format = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Dispatch and lifecycle settings
    pub manager: ManagerConfig,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Dispatch and lifecycle behaviour of a [`crate::PluginManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Catch panics raised by handlers, hooks and factories and report them
    /// like returned errors. When off, a panic unwinds through the caller.
    pub catch_panics: bool,
    /// Log a warning when an event is sent that nobody handles
    pub warn_unhandled: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            warn_unhandled: false,
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl HostConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a TOML file; missing sections take their defaults
    ///
    /// # Returns
    ///
    /// The validated configuration, or an I/O, parse or validation error.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("📋 Loaded host configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PluginHostError::Config(e.to_string()))
    }

    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(PluginHostError::Config(format!(
                "Invalid log level '{}', expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.manager.catch_panics);
        assert!(!config.manager.warn_unhandled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = HostConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
        assert_eq!(config.manager, ManagerConfig::default());

        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(PluginHostError::Config(_))));

        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());

        let parsed = HostConfig::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(parsed, Err(PluginHostError::Config(_))));

        let malformed = HostConfig::from_toml_str("[manager\ncatch_panics = true");
        assert!(matches!(malformed, Err(PluginHostError::ConfigParse(_))));
    }

    #[test]
    fn test_round_trip_through_file() {
        let mut config = HostConfig::default();
        config.manager.warn_unhandled = true;
        config.logging.json_format = true;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = HostConfig::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = HostConfig::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(PluginHostError::Io(_))));
    }
}
