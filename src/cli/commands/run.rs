//! Run command - reconcile one resource against a facts file

use super::{load_want, CommandContext};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use awplus::modules::network::{FileFactsReader, Mode, NetworkDevice, SaveWhen, TranscriptSink};
use awplus::modules::{ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Exit code when `--fail-on-change` is set and commands were produced
pub const EXIT_CHANGED: i32 = 2;

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Resource module to run (see `awplus list`)
    pub module: String,

    /// State: merged, replaced, overridden or deleted
    #[arg(short, long)]
    pub state: Option<String>,

    /// Desired configuration file (YAML or JSON)
    #[arg(short, long)]
    pub want: Option<PathBuf>,

    /// Facts file, or a directory with one `<resource>.yaml` per resource
    #[arg(short, long)]
    pub facts: PathBuf,

    /// Append the configuration session to this file
    #[arg(short, long)]
    pub transcript: Option<PathBuf>,

    /// Device name used in logs and output
    #[arg(long)]
    pub hostname: Option<String>,

    /// When to save the configuration: always, never, changed
    #[arg(long)]
    pub save_when: Option<String>,

    /// Exit with status 2 when any command was produced
    #[arg(long)]
    pub fail_on_change: bool,
}

/// What `run` prints in the json and yaml formats
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    module: &'a str,
    host: &'a str,
    state: Mode,
    check_mode: bool,
    changed: bool,
    msg: &'a str,
    commands: Vec<String>,
    before: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.banner(&format!("AWPLUS RUN [{}]", self.module));

        if !self.facts.exists() {
            let err = awplus::Error::FactsNotFound(self.facts.clone());
            ctx.output.error(&err.to_string());
            return Ok(err.exit_code());
        }

        let mut params = match &self.want {
            Some(path) => load_want(path)?,
            None => ModuleParams::new(),
        };
        let state = self.resolve_state(&params, ctx)?;
        params.insert("state".to_string(), Value::from(state.as_str()));

        let device = Arc::new(self.build_device(ctx)?);
        ctx.output.info(&format!(
            "Running {} with state {} against {}",
            self.module,
            state,
            device.hostname()
        ));

        let module_ctx = ModuleContext::new()
            .with_check_mode(ctx.check_mode)
            .with_diff_mode(ctx.diff_mode)
            .with_device(Arc::clone(&device));

        let registry = ModuleRegistry::with_builtins();
        let output = match registry.execute(&self.module, &params, &module_ctx) {
            Ok(output) => output,
            Err(e) => {
                let err = awplus::Error::module(&self.module, e);
                if err.is_validation() {
                    ctx.output.debug("desired configuration rejected, device left untouched");
                }
                ctx.output.error(&err.to_string());
                return Ok(err.exit_code());
            }
        };

        self.report(ctx, device.hostname(), state, &output)?;

        if self.fail_on_change && output.changed {
            Ok(EXIT_CHANGED)
        } else {
            Ok(0)
        }
    }

    /// `--state`, then the want file's `state`, then the configured default
    fn resolve_state(&self, params: &ModuleParams, ctx: &CommandContext) -> Result<Mode> {
        let state = match (&self.state, params.get("state").and_then(Value::as_str)) {
            (Some(cli), _) => cli.parse::<Mode>()?,
            (None, Some(file)) => file.parse::<Mode>()?,
            (None, None) => ctx.config.defaults.state,
        };
        Ok(state)
    }

    fn build_device(&self, ctx: &CommandContext) -> Result<NetworkDevice> {
        let device_config = &ctx.config.device;
        let hostname = self
            .hostname
            .clone()
            .unwrap_or_else(|| device_config.hostname.clone());
        let save_when = match &self.save_when {
            Some(s) => s.parse::<SaveWhen>()?,
            None => device_config.save_when,
        };

        let sink = match self.transcript.as_ref().or(device_config.transcript.as_ref()) {
            Some(path) => TranscriptSink::to_file(path)
                .with_context(|| format!("Failed to open transcript: {}", path.display()))?,
            None => TranscriptSink::new(Box::new(std::io::sink())),
        };

        Ok(NetworkDevice::new(
            hostname,
            Arc::new(FileFactsReader::new(&self.facts)),
            Arc::new(sink),
        )
        .with_save_when(save_when))
    }

    fn report(
        &self,
        ctx: &CommandContext,
        host: &str,
        state: Mode,
        output: &ModuleOutput,
    ) -> Result<()> {
        let commands = output.commands();
        let diff = output.diff.as_ref().and_then(|d| d.details.clone());

        match ctx.format {
            OutputFormat::Human => {
                ctx.output.status(&self.module, output.changed, &output.msg);
                ctx.output.section("Commands");
                ctx.output.commands(&commands);
                if let Some(details) = &diff {
                    ctx.output.section("Diff");
                    ctx.output.diff(details);
                }
                ctx.output.debug(&format!(
                    "before: {}",
                    output.data.get("before").cloned().unwrap_or(Value::Null)
                ));
            }
            format => {
                let report = RunReport {
                    module: &self.module,
                    host,
                    state,
                    check_mode: ctx.check_mode,
                    changed: output.changed,
                    msg: &output.msg,
                    commands,
                    before: output.data.get("before").cloned().unwrap_or(Value::Null),
                    after: output.data.get("after").cloned(),
                    diff,
                };
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", serde_yaml::to_string(&report)?);
                }
            }
        }

        ctx.output.flush();
        Ok(())
    }
}
