//! # awplus - Declarative Resource Modules for AlliedWare Plus
//!
//! awplus reconciles the configuration of Allied Telesis AlliedWare Plus (AW+) switches.
//! Each resource module gathers the current configuration of one resource (`have`),
//! compares it with a declared desired configuration (`want`) and produces the minimal,
//! ordered list of CLI commands that takes the switch from one to the other.
//!
//! ## Core Concepts
//!
//! - **Resources**: VLANs, interfaces, LAGs, LLDP, NTP, static routes, users and banners
//! - **States**: `merged`, `replaced`, `overridden` and `deleted`
//! - **Facts**: The structured `have` of a resource, read through a [`ConfigReader`]
//! - **Commands**: AW+ CLI lines, sent through a [`CommandSink`]
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                Module Registry (awplus_* resource modules)           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │ Resource specs  │   │ Reconciliation      │   │   NetworkDevice     │
//! │ (fields, rules, │   │ engine (per-state   │   │ (reader, sink,      │
//! │  validation)    │   │  command builder)   │   │  config session)    │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use awplus::prelude::*;
//! use std::sync::Arc;
//!
//! let device = NetworkDevice::new(
//!     "core-1",
//!     Arc::new(FileFactsReader::new("facts/")),
//!     Arc::new(TranscriptSink::to_file("session.log".as_ref())?),
//! );
//! let context = ModuleContext::new().with_device(Arc::new(device));
//!
//! let mut params = ModuleParams::new();
//! params.insert("config".into(), serde_json::json!([{"vlan_id": 10, "name": "users"}]));
//! params.insert("state".into(), "merged".into());
//!
//! let output = ModuleRegistry::with_builtins().execute("awplus_vlans", &params, &context)?;
//! println!("{:?}", output.commands());
//! ```

#![warn(clippy::all)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Module system
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult,
    };

    // Network resources
    pub use crate::modules::network::{
        reconcile, CommandSink, ConfigReader, Facts, FileFactsReader, Mode, NetworkDevice,
        ResourceCollection, ResourceModule, ResourceSpec, SaveWhen, TranscriptSink,
    };

    // Configuration
    pub use crate::config::Config;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases for awplus operations.
pub mod error;

/// Module system: the [`Module`](modules::Module) trait, the registry and the AW+
/// resource modules.
pub mod modules;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration management for awplus behavior.
///
/// Handles loading and merging configuration from multiple sources:
/// environment variables, config files, and command-line arguments.
pub mod config;

pub use error::{Error, Result};
pub use modules::network::{CommandSink, ConfigReader};

/// Returns the current version of awplus.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
