//! Network Device Modules
//!
//! Declarative resource modules for Allied Telesis AlliedWare Plus switches. Every module
//! follows the same cycle:
//!
//! 1. Read the current configuration of its resource (`have`) from the device
//! 2. Compare it with the declared configuration (`want`) under the requested state
//! 3. Send the resulting commands, unless running in check mode
//! 4. Read the configuration again and report `before`, `after` and `commands`
//!
//! # States
//!
//! - **merged**: add and update; never remove
//! - **replaced**: make each listed instance match exactly
//! - **overridden**: make the whole resource match; remove unlisted instances
//! - **deleted**: remove listed instances or fields, or everything when none are listed
//!
//! # Example Usage
//!
//! ```yaml
//! - name: Trunk the uplink
//!   awplus_l2_interfaces:
//!     config:
//!       - name: port1.0.24
//!         trunk:
//!           allowed_vlans: [10, 20, 30]
//!           native_vlan: 1
//!     state: replaced
//! ```
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +-------------------+     +-------------------+
//! | ResourceModule   |---->| reconcile()       |---->| ResourceSpec      |
//! |  (facade)        |     |  (engine)         |     |  (awplus/*.rs)    |
//! +------------------+     +-------------------+     +-------------------+
//!         |
//!         v
//! +------------------+     +-------------------+
//! | NetworkDevice    |---->| ConfigReader      |
//! |                  |---->| CommandSink       |
//! +------------------+     +-------------------+
//! ```

pub mod awplus;
pub mod common;
pub mod engine;
pub mod facade;
pub mod model;

// Re-export main types for convenience
pub use common::{
    generate_config_diff, generate_facts_diff, AwplusCommandGenerator, CommandSink,
    ConfigCommandGenerator, ConfigReader, Facts, FactsParser, FileFactsReader, NetworkDevice,
    SaveWhen, StructuredFactsParser, TranscriptSink,
};
pub use engine::{
    reconcile, validate_want, CommandBuffer, FieldRule, Mode, OrderingRules, OverrideOrder,
    ResourceSpec, Scope,
};
pub use facade::{ResourceModule, ResourceParams, ResourceResult};
pub use model::{ResourceCollection, ResourceInstance};

use crate::modules::ModuleRegistry;

/// Register all network modules with the registry
pub fn register_network_modules(registry: &mut ModuleRegistry) {
    for module in awplus::resource_modules() {
        registry.register(module);
    }
}

/// Names of all network modules
pub fn network_module_names() -> Vec<&'static str> {
    awplus::resource_modules().iter().map(|m| m.name()).collect()
}

/// Resource names (`vlans`, `lacp`, ...), as used to key facts documents
pub fn resource_names() -> Vec<&'static str> {
    network_module_names()
        .into_iter()
        .map(|name| name.strip_prefix("awplus_").unwrap_or(name))
        .collect()
}
