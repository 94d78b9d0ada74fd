//! CLI module for awplus
//!
//! Argument parsing and subcommand handling for running the AlliedWare Plus
//! resource modules against a facts file.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// awplus - declarative configuration for AlliedWare Plus switches
///
/// Compares a desired configuration with the facts gathered from a switch and
/// prints the commands that reconcile them.
#[derive(Parser, Debug, Clone)]
#[command(name = "awplus")]
#[command(author = "awplus Contributors")]
#[command(version)]
#[command(about = "Declarative resource modules for AlliedWare Plus switches", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run in check mode (compute commands without applying them)
    #[arg(long = "check", global = true)]
    pub check_mode: bool,

    /// Show the differences between before and after
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Output format
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(short = 'c', long = "config-file", global = true, env = "AWPLUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

impl OutputFormat {
    /// Parse a format name from the configuration file, falling back to human
    pub fn from_config(name: &str) -> Self {
        <Self as ValueEnum>::from_str(name, true).unwrap_or_default()
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the registered resource modules
    List(commands::list::ListArgs),

    /// Reconcile a desired configuration against gathered facts
    Run(commands::run::RunArgs),

    /// Validate a desired configuration without reading any facts
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

/// Environment variable helper functions
pub mod env {
    use std::env;

    /// Check if colors should be disabled
    pub fn no_color() -> bool {
        env::var_os("NO_COLOR").is_some() || env::var_os("AWPLUS_NO_COLOR").is_some()
    }
}
