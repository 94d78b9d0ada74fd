//! Subcommands module for the awplus CLI

pub mod list;
pub mod run;
pub mod validate;

use crate::cli::output::OutputFormatter;
use crate::cli::{Cli, OutputFormat};
use anyhow::{Context, Result};
use awplus::config::Config;
use awplus::modules::ModuleParams;
use serde_json::Value;
use std::path::Path;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Selected output format
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: u8,
    /// Check mode (compute only)
    pub check_mode: bool,
    /// Diff mode
    pub diff_mode: bool,
}

impl CommandContext {
    /// Create a new command context from CLI arguments and loaded configuration
    pub fn new(cli: &Cli, config: Config) -> Self {
        let format = cli
            .output
            .unwrap_or_else(|| OutputFormat::from_config(&config.defaults.output));
        let use_color = !cli.no_color && !crate::cli::env::no_color();
        let output = OutputFormatter::new(use_color, format != OutputFormat::Human, cli.verbosity());

        Self {
            check_mode: cli.check_mode || config.defaults.check_mode,
            diff_mode: cli.diff_mode || config.defaults.diff_mode,
            verbosity: cli.verbosity(),
            output,
            format,
            config,
        }
    }
}

/// Load module parameters from a desired-configuration file.
///
/// The file holds either the `config` list itself, or a mapping with `config` and an
/// optional `state`.
pub fn load_want(path: &Path) -> Result<ModuleParams> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read desired configuration: {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .map_err(|e| awplus::Error::want_load(path, e.to_string()))?;

    let mut params = ModuleParams::new();
    match value {
        Value::Null => {}
        Value::Object(map) if map.contains_key("config") || map.contains_key("state") => {
            params.extend(map);
        }
        other => {
            params.insert("config".to_string(), other);
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn want_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_want_list() {
        let file = want_file("- vlan_id: 10\n  name: users\n");
        let params = load_want(file.path()).unwrap();
        assert!(params["config"].is_array());
        assert!(!params.contains_key("state"));
    }

    #[test]
    fn test_load_want_mapping_with_state() {
        let file = want_file("config:\n  - vlan_id: 10\nstate: replaced\n");
        let params = load_want(file.path()).unwrap();
        assert_eq!(params["state"], Value::from("replaced"));
    }

    #[test]
    fn test_load_want_global_mapping() {
        let file = want_file("system_priority: 100\n");
        let params = load_want(file.path()).unwrap();
        assert_eq!(params["config"]["system_priority"], Value::from(100));
    }

    #[test]
    fn test_load_want_empty_file() {
        let file = want_file("");
        assert!(load_want(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_want_invalid_yaml() {
        let file = want_file("config: [unclosed");
        let err = load_want(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load desired configuration"));
    }
}
