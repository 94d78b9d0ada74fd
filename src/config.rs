//! Configuration module for awplus
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/awplus/awplus.toml)
//! - User configuration (~/.awplus.toml)
//! - Project configuration (./awplus.toml)
//! - Environment variables
//! - Command-line arguments

use crate::modules::network::{Mode, SaveWhen};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Device adapter settings
    pub device: DeviceConfig,
}

/// Defaults applied when the command line does not say otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// State used when `--state` is not given
    pub state: Mode,

    /// Always run in check mode
    pub check_mode: bool,

    /// Always show diffs
    pub diff_mode: bool,

    /// Output format (human, json, yaml)
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            state: Mode::Merged,
            check_mode: false,
            diff_mode: false,
            output: "human".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when `-v` is not given
    pub level: String,

    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

/// Settings for the device the modules talk to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name reported in logs and output
    pub hostname: String,

    /// When to copy running-config to startup-config
    pub save_when: SaveWhen,

    /// File the configuration session is appended to
    pub transcript: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: "switch".to_string(),
            save_when: SaveWhen::Never,
            transcript: None,
        }
    }
}

impl Config {
    /// Load configuration from the standard locations, or only `config_path` when given
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if config_path == Some(&path) {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/awplus/awplus.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".awplus.toml"));
        }
        paths.push(PathBuf::from("awplus.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; non-default values of `other` win
    fn merge(&self, other: Config) -> Config {
        let base_defaults = Defaults::default();
        let base_logging = LoggingConfig::default();
        let base_device = DeviceConfig::default();

        Config {
            defaults: Defaults {
                state: if other.defaults.state != base_defaults.state {
                    other.defaults.state
                } else {
                    self.defaults.state
                },
                check_mode: other.defaults.check_mode || self.defaults.check_mode,
                diff_mode: other.defaults.diff_mode || self.defaults.diff_mode,
                output: if other.defaults.output != base_defaults.output {
                    other.defaults.output
                } else {
                    self.defaults.output.clone()
                },
            },
            logging: LoggingConfig {
                level: if other.logging.level != base_logging.level {
                    other.logging.level
                } else {
                    self.logging.level.clone()
                },
                json: other.logging.json || self.logging.json,
            },
            device: DeviceConfig {
                hostname: if other.device.hostname != base_device.hostname {
                    other.device.hostname
                } else {
                    self.device.hostname.clone()
                },
                save_when: if other.device.save_when != base_device.save_when {
                    other.device.save_when
                } else {
                    self.device.save_when
                },
                transcript: other
                    .device
                    .transcript
                    .or_else(|| self.device.transcript.clone()),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // AWPLUS_STATE
        if let Ok(state) = std::env::var("AWPLUS_STATE") {
            if let Ok(mode) = state.parse() {
                self.defaults.state = mode;
            }
        }

        // AWPLUS_CHECK_MODE
        if let Ok(check) = std::env::var("AWPLUS_CHECK_MODE") {
            self.defaults.check_mode = matches!(
                check.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        // AWPLUS_LOG_LEVEL
        if let Ok(level) = std::env::var("AWPLUS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Load from a specific file only
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}
