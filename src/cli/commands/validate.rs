//! Validate command - check a desired configuration without touching any device

use super::{load_want, CommandContext};
use crate::cli::OutputFormat;
use anyhow::Result;
use awplus::modules::network::Mode;
use awplus::modules::ModuleRegistry;
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Resource module the configuration is meant for
    pub module: String,

    /// Desired configuration file (YAML or JSON)
    #[arg(short, long)]
    pub want: PathBuf,

    /// State to validate for; defaults to the file's `state` or the configured default
    #[arg(short, long)]
    pub state: Option<String>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.banner(&format!("AWPLUS VALIDATE [{}]", self.module));

        let registry = ModuleRegistry::with_builtins();
        let Some(module) = registry.get(&self.module) else {
            let err = awplus::Error::ModuleNotFound(self.module.clone());
            ctx.output.error(&err.to_string());
            return Ok(err.exit_code());
        };

        let mut params = load_want(&self.want)?;
        if let Some(state) = &self.state {
            params.insert("state".to_string(), Value::from(state.parse::<Mode>()?.as_str()));
        } else if !params.contains_key("state") {
            params.insert(
                "state".to_string(),
                Value::from(ctx.config.defaults.state.as_str()),
            );
        }
        ctx.output
            .debug(&format!("Validating {} against {}", self.want.display(), self.module));

        let result = module
            .validate_params(&params)
            .map_err(|e| awplus::Error::module(&self.module, e));

        match (&result, ctx.format) {
            (_, OutputFormat::Human) => {}
            (Ok(()), format) => print_machine(format, &json!({"module": self.module, "valid": true}))?,
            (Err(e), format) => print_machine(
                format,
                &json!({"module": self.module, "valid": false, "error": e.to_string()}),
            )?,
        }

        match result {
            Ok(()) => {
                ctx.output.status(&self.module, false, "desired configuration is valid");
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(e.exit_code())
            }
        }
    }
}

fn print_machine(format: OutputFormat, value: &Value) -> Result<()> {
    if format == OutputFormat::Yaml {
        print!("{}", serde_yaml::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
