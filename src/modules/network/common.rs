//! Common network device utilities and types
//!
//! This module provides the collaborators the resource modules talk to:
//! - Configuration readers and command sinks (the device boundary)
//! - Facts parsing from raw text
//! - AW+ configuration session commands
//! - Before/after diff generation

use super::model::strip_nulls;
use crate::modules::{Diff, ModuleError, ModuleResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Device Boundary
// ============================================================================

/// What a configuration reader hands back for one resource
#[derive(Debug, Clone, PartialEq)]
pub enum Facts {
    /// Already-structured facts: a list of instances or a single mapping
    Structured(Value),
    /// Raw text that still has to go through a [`FactsParser`]
    Raw(String),
}

/// Reads the current configuration of one resource from a device
pub trait ConfigReader: Send + Sync {
    fn read(&self, resource: &str) -> ModuleResult<Facts>;
}

/// Pushes an ordered list of commands to a device.
///
/// Implementations apply the commands in order and report the first failure. No retry and
/// no rollback happen at this layer.
pub trait CommandSink: Send + Sync {
    fn apply(&self, commands: &[String]) -> ModuleResult<()>;
}

/// Turns raw facts text into a structured value
pub trait FactsParser: Send + Sync {
    fn parse(&self, resource: &str, raw: &str) -> ModuleResult<Value>;
}

/// Parses YAML or JSON facts.
///
/// Accepts either the bare list (or mapping, for global resources) or a document keyed by
/// resource name, such as `vlans: [...]`. A keyed document without an entry for the
/// resource being read holds no facts for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredFactsParser;

impl FactsParser for StructuredFactsParser {
    fn parse(&self, resource: &str, raw: &str) -> ModuleResult<Value> {
        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_yaml::from_str(raw)
            .map_err(|e| ModuleError::ParseError(format!("{} facts: {}", resource, e)))?;
        let value = match value {
            Value::Object(mut map) if map.contains_key(resource) => {
                map.remove(resource).unwrap_or(Value::Null)
            }
            Value::Object(map) if is_keyed_by_resource(&map) => Value::Null,
            other => other,
        };
        Ok(strip_nulls(value))
    }
}

fn is_keyed_by_resource(map: &serde_json::Map<String, Value>) -> bool {
    let names = super::resource_names();
    !map.is_empty() && map.keys().all(|key| names.contains(&key.as_str()))
}

// ============================================================================
// Command Generation
// ============================================================================

/// Platform-specific commands that frame a configuration session
pub trait ConfigCommandGenerator: Send + Sync {
    /// Commands to enter configuration mode
    fn enter_config_mode(&self) -> Vec<String>;

    /// Commands to leave configuration mode
    fn exit_config_mode(&self) -> Vec<String>;

    /// Commands to persist the running configuration
    fn save_config(&self) -> Vec<String>;

    /// Wrap configuration lines in a full session
    fn apply_config_lines(&self, lines: &[String]) -> Vec<String> {
        let mut commands = self.enter_config_mode();
        commands.extend(lines.iter().cloned());
        commands.extend(self.exit_config_mode());
        commands
    }
}

/// AlliedWare Plus command generator
#[derive(Debug, Clone, Copy, Default)]
pub struct AwplusCommandGenerator;

impl ConfigCommandGenerator for AwplusCommandGenerator {
    fn enter_config_mode(&self) -> Vec<String> {
        vec!["configure terminal".to_string()]
    }

    fn exit_config_mode(&self) -> Vec<String> {
        vec!["end".to_string()]
    }

    fn save_config(&self) -> Vec<String> {
        vec!["copy running-config startup-config".to_string()]
    }
}

/// When to save the running configuration to startup-config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaveWhen {
    /// Save on every run, even without changes
    Always,
    /// Never save automatically (default)
    #[default]
    Never,
    /// Save only after commands were applied
    Changed,
}

impl std::str::FromStr for SaveWhen {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(SaveWhen::Always),
            "never" => Ok(SaveWhen::Never),
            "changed" | "modified" => Ok(SaveWhen::Changed),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid save_when '{}'. Valid options: always, never, changed",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SaveWhen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveWhen::Always => write!(f, "always"),
            SaveWhen::Never => write!(f, "never"),
            SaveWhen::Changed => write!(f, "changed"),
        }
    }
}

// ============================================================================
// Network Device
// ============================================================================

/// One AW+ switch as seen by the resource modules
pub struct NetworkDevice {
    hostname: String,
    reader: Arc<dyn ConfigReader>,
    sink: Arc<dyn CommandSink>,
    parser: Arc<dyn FactsParser>,
    generator: Box<dyn ConfigCommandGenerator>,
    save_when: SaveWhen,
}

impl NetworkDevice {
    pub fn new(
        hostname: impl Into<String>,
        reader: Arc<dyn ConfigReader>,
        sink: Arc<dyn CommandSink>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            reader,
            sink,
            parser: Arc::new(StructuredFactsParser),
            generator: Box::new(AwplusCommandGenerator),
            save_when: SaveWhen::Never,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn FactsParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_save_when(mut self, save_when: SaveWhen) -> Self {
        self.save_when = save_when;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn save_when(&self) -> SaveWhen {
        self.save_when
    }

    /// Current facts for `resource`, parsed if the reader returned raw text
    pub fn get_facts(&self, resource: &str) -> ModuleResult<Value> {
        debug!(host = %self.hostname, resource, "reading facts");
        match self.reader.read(resource)? {
            Facts::Structured(value) => Ok(strip_nulls(value)),
            Facts::Raw(text) => self.parser.parse(resource, &text),
        }
    }

    /// Apply `lines` inside one configuration session.
    ///
    /// Any sink failure is reported as [`ModuleError::ApplyFailed`] carrying the lines that
    /// were attempted.
    pub fn apply_config(&self, lines: &[String]) -> ModuleResult<()> {
        let mut session = self.generator.apply_config_lines(lines);
        if self.save_when != SaveWhen::Never {
            session.extend(self.generator.save_config());
        }

        self.sink.apply(&session).map_err(|e| match e {
            ModuleError::ApplyFailed { .. } => e,
            other => ModuleError::ApplyFailed {
                commands: lines.to_vec(),
                message: other.to_string(),
            },
        })?;
        info!(host = %self.hostname, commands = lines.len(), "configuration applied");
        Ok(())
    }

    /// Save without applying anything, used for `save_when: always` on unchanged runs
    pub fn save_config(&self) -> ModuleResult<()> {
        let commands = self.generator.save_config();
        self.sink.apply(&commands).map_err(|e| ModuleError::ApplyFailed {
            commands,
            message: e.to_string(),
        })
    }
}

// ============================================================================
// File Adapters
// ============================================================================

/// Reads facts from files.
///
/// The path is either one facts file (used for every resource) or a directory holding
/// `<resource>.yaml`, `<resource>.yml` or `<resource>.json`. A missing per-resource file
/// in a directory reads as no configuration.
#[derive(Debug, Clone)]
pub struct FileFactsReader {
    path: PathBuf,
}

impl FileFactsReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn resource_file(&self, resource: &str) -> Option<PathBuf> {
        if !self.path.is_dir() {
            return Some(self.path.clone());
        }
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| self.path.join(format!("{}.{}", resource, ext)))
            .find(|candidate| candidate.exists())
    }
}

impl ConfigReader for FileFactsReader {
    fn read(&self, resource: &str) -> ModuleResult<Facts> {
        let Some(path) = self.resource_file(resource) else {
            debug!(dir = %self.path.display(), resource, "no facts file, assuming empty");
            return Ok(Facts::Raw(String::new()));
        };
        let text = fs::read_to_string(&path).map_err(|e| {
            ModuleError::ReadFailed(format!("{}: {}", path.display(), e))
        })?;
        Ok(Facts::Raw(text))
    }
}

/// Writes every configuration session to a writer instead of a live device
pub struct TranscriptSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl TranscriptSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Append sessions to `path`, creating it if needed
    pub fn to_file(path: &Path) -> ModuleResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file)))
    }
}

impl CommandSink for TranscriptSink {
    fn apply(&self, commands: &[String]) -> ModuleResult<()> {
        let mut writer = self.writer.lock();
        for command in commands {
            writeln!(writer, "{}", command)?;
        }
        writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// Configuration Diff
// ============================================================================

/// Generate a unified diff between two texts
pub fn generate_config_diff(before: &str, after: &str) -> Diff {
    let text_diff = TextDiff::from_lines(before, after);

    let mut additions = 0;
    let mut deletions = 0;
    for change in text_diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Insert => additions += 1,
            ChangeTag::Equal => {}
        }
    }

    let details = text_diff
        .unified_diff()
        .context_radius(3)
        .header("before", "after")
        .to_string();

    Diff::new(
        format!("{} lines", before.lines().count()),
        format!(
            "{} lines ({} additions, {} deletions)",
            after.lines().count(),
            additions,
            deletions
        ),
    )
    .with_details(details)
}

/// Diff two facts values through their YAML rendering
pub fn generate_facts_diff(before: &Value, after: &Value) -> ModuleResult<Diff> {
    let render = |value: &Value| {
        serde_yaml::to_string(value).map_err(|e| ModuleError::ParseError(e.to_string()))
    };
    Ok(generate_config_diff(&render(before)?, &render(after)?))
}
