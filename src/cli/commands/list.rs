//! List command - show the registered resource modules

use super::CommandContext;
use crate::cli::OutputFormat;
use anyhow::Result;
use awplus::modules::ModuleRegistry;
use clap::Parser;
use serde::Serialize;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Include each module's description
    #[arg(short, long)]
    pub long: bool,
}

#[derive(Debug, Serialize)]
struct ModuleEntry {
    name: String,
    description: String,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let registry = ModuleRegistry::with_builtins();
        let entries: Vec<ModuleEntry> = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.get(name))
            .map(|module| ModuleEntry {
                name: module.name().to_string(),
                description: module.description().to_string(),
            })
            .collect();

        match ctx.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&entries)?),
            OutputFormat::Human => {
                let items: Vec<String> = entries
                    .iter()
                    .map(|e| {
                        if self.long {
                            format!("{:<24} {}", e.name, e.description)
                        } else {
                            e.name.clone()
                        }
                    })
                    .collect();
                ctx.output.list("Resource modules", &items);
            }
        }

        ctx.output.flush();
        Ok(0)
    }
}
