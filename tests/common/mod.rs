//! Shared test utilities for the awplus test suite.
//!
//! This module provides:
//! - A scripted [`ConfigReader`] returning queued facts per resource
//! - A recording [`CommandSink`] and one that always fails
//! - Helpers to build a [`ModuleContext`] around them
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use awplus::modules::network::{CommandSink, ConfigReader, Facts, NetworkDevice, SaveWhen};
use awplus::modules::{ModuleContext, ModuleError, ModuleParams, ModuleResult};

// ============================================================================
// Mock Reader
// ============================================================================

/// Hands out facts per resource in order; the last entry repeats forever
#[derive(Default)]
pub struct MockReader {
    facts: Mutex<HashMap<String, VecDeque<Value>>>,
    reads: Mutex<Vec<String>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts returned on every read of `resource`
    pub fn with_facts(self, resource: &str, facts: Value) -> Self {
        self.with_sequence(resource, vec![facts])
    }

    /// Facts returned on successive reads of `resource`
    pub fn with_sequence(self, resource: &str, facts: Vec<Value>) -> Self {
        self.facts
            .lock()
            .insert(resource.to_string(), facts.into_iter().collect());
        self
    }

    /// Resources read so far, in order
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }
}

impl ConfigReader for MockReader {
    fn read(&self, resource: &str) -> ModuleResult<Facts> {
        self.reads.lock().push(resource.to_string());
        let mut facts = self.facts.lock();
        let value = match facts.get_mut(resource) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Value::Null),
            Some(queue) => queue.front().cloned().unwrap_or(Value::Null),
            None => Value::Null,
        };
        Ok(Facts::Structured(value))
    }
}

// ============================================================================
// Mock Sinks
// ============================================================================

/// Records every configuration session it receives
#[derive(Default)]
pub struct RecordingSink {
    sessions: Mutex<Vec<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<Vec<String>> {
        self.sessions.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn apply(&self, commands: &[String]) -> ModuleResult<()> {
        self.sessions.lock().push(commands.to_vec());
        Ok(())
    }
}

/// Rejects every session, as a switch would on a bad command
pub struct FailingSink(pub String);

impl CommandSink for FailingSink {
    fn apply(&self, _commands: &[String]) -> ModuleResult<()> {
        Err(ModuleError::ReadFailed(self.0.clone()))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// A device named `sw1` over the given reader and sink
pub fn device(reader: Arc<MockReader>, sink: Arc<dyn CommandSink>) -> NetworkDevice {
    NetworkDevice::new("sw1", reader, sink)
}

/// A context around a fresh recording sink
pub fn context_with(
    reader: MockReader,
    save_when: SaveWhen,
) -> (ModuleContext, Arc<MockReader>, Arc<RecordingSink>) {
    let reader = Arc::new(reader);
    let sink = Arc::new(RecordingSink::new());
    let device = device(Arc::clone(&reader), sink.clone()).with_save_when(save_when);
    (
        ModuleContext::new().with_device(Arc::new(device)),
        reader,
        sink,
    )
}

/// Module parameters from a JSON object
pub fn params(value: Value) -> ModuleParams {
    serde_json::from_value(value).expect("params must be a JSON object")
}

/// Owned command lines from string literals
pub fn lines(commands: &[&str]) -> Vec<String> {
    commands.iter().map(|c| c.to_string()).collect()
}
