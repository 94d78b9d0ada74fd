//! AlliedWare Plus resource modules
//!
//! One file per resource. Each file declares the resource's field table and hooks; the
//! shared [`ResourceModule`] facade turns it into a runnable module.

pub mod banner;
pub mod interfaces;
pub mod l2_interfaces;
pub mod lacp;
pub mod lacp_interfaces;
pub mod lag_interfaces;
pub mod lldp_global;
pub mod lldp_interfaces;
pub mod ntp;
pub mod static_routes;
pub mod user;
pub mod vlans;

use super::facade::ResourceModule;
use super::model::ResourceInstance;
use crate::modules::{Module, ModuleError, ModuleResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Every AW+ resource module, ready to register
pub fn resource_modules() -> Vec<Arc<dyn Module>> {
    vec![
        Arc::new(ResourceModule::new(
            "awplus_banner",
            "Manage the AW+ motd and exec banners",
            banner::Banner,
        )),
        Arc::new(ResourceModule::new(
            "awplus_interfaces",
            "Manage AW+ interface attributes",
            interfaces::Interfaces,
        )),
        Arc::new(ResourceModule::new(
            "awplus_l2_interfaces",
            "Manage AW+ switchport access and trunk settings",
            l2_interfaces::L2Interfaces,
        )),
        Arc::new(ResourceModule::new(
            "awplus_lacp",
            "Manage global AW+ LACP settings",
            lacp::Lacp,
        )),
        Arc::new(ResourceModule::new(
            "awplus_lacp_interfaces",
            "Manage per-port AW+ LACP settings",
            lacp_interfaces::LacpInterfaces,
        )),
        Arc::new(ResourceModule::new(
            "awplus_lag_interfaces",
            "Manage AW+ dynamic link aggregation groups",
            lag_interfaces::LagInterfaces,
        )),
        Arc::new(ResourceModule::new(
            "awplus_lldp_global",
            "Manage global AW+ LLDP settings",
            lldp_global::LldpGlobal,
        )),
        Arc::new(ResourceModule::new(
            "awplus_lldp_interfaces",
            "Manage per-port AW+ LLDP transmit and receive",
            lldp_interfaces::LldpInterfaces,
        )),
        Arc::new(ResourceModule::new(
            "awplus_ntp",
            "Manage AW+ NTP servers, peers and source interface",
            ntp::Ntp,
        )),
        Arc::new(ResourceModule::new(
            "awplus_static_routes",
            "Manage AW+ IPv4 static routes",
            static_routes::StaticRoutes,
        )),
        Arc::new(ResourceModule::new(
            "awplus_user",
            "Manage AW+ local user accounts",
            user::User,
        )),
        Arc::new(ResourceModule::new(
            "awplus_vlans",
            "Manage AW+ VLANs in the VLAN database",
            vlans::Vlans,
        )),
    ]
}

static INTERFACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(port\d+\.\d+\.\d+|po\d+|sa\d+|vlan\d+|eth\d+|lo)$")
        .expect("Invalid interface name regex")
});

/// Check an interface name against AW+ naming
pub(crate) fn validate_interface_name(resource: &str, name: &str) -> ModuleResult<()> {
    if INTERFACE_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(ModuleError::validation(
            resource,
            format!(
                "'{}' is not an AW+ interface name (portX.Y.Z, poN, saN, vlanN, ethN, lo)",
                name
            ),
        ))
    }
}

pub(crate) fn interface_context(name: &str) -> Option<String> {
    Some(format!("interface {}", name))
}

/// Text of a scalar as it appears on the command line
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Elements of a list value, empty for anything else
pub(crate) fn items(value: &Value) -> impl Iterator<Item = &Value> {
    value.as_array().into_iter().flatten()
}

/// Clear renderer for fields that have no negated form
pub(crate) fn no_lines(_key: &str, _value: &Value) -> Vec<String> {
    Vec::new()
}

/// Require `field`, when present, to be an integer within `min..=max`
pub(crate) fn check_range(
    resource: &str,
    key: &str,
    instance: &ResourceInstance,
    field: &str,
    min: i64,
    max: i64,
) -> ModuleResult<()> {
    match instance.get(field) {
        None => Ok(()),
        Some(value) => check_value_range(resource, key, field, value, min, max),
    }
}

pub(crate) fn check_value_range(
    resource: &str,
    key: &str,
    field: &str,
    value: &Value,
    min: i64,
    max: i64,
) -> ModuleResult<()> {
    match value.as_i64() {
        Some(n) if (min..=max).contains(&n) => Ok(()),
        _ => Err(ModuleError::validation(
            resource,
            format!("{} of {} must be an integer between {} and {}, got {}", field, key, min, max, value),
        )),
    }
}

/// Require `field`, when present, to be one of `choices`
pub(crate) fn check_choice(
    resource: &str,
    key: &str,
    instance: &ResourceInstance,
    field: &str,
    choices: &[&str],
) -> ModuleResult<()> {
    match instance.get(field) {
        None => Ok(()),
        Some(Value::String(s)) if choices.contains(&s.as_str()) => Ok(()),
        Some(other) => Err(ModuleError::validation(
            resource,
            format!(
                "{} of {} must be one of {}, got {}",
                field,
                key,
                choices.join(", "),
                other
            ),
        )),
    }
}

/// Require `field`, when present, to be a boolean
pub(crate) fn check_bool(
    resource: &str,
    key: &str,
    instance: &ResourceInstance,
    field: &str,
) -> ModuleResult<()> {
    match instance.get(field) {
        None | Some(Value::Bool(_)) => Ok(()),
        Some(other) => Err(ModuleError::validation(
            resource,
            format!("{} of {} must be a boolean, got {}", field, key, other),
        )),
    }
}

/// Reject fields the resource does not know about
pub(crate) fn check_known_fields(
    resource: &str,
    key: &str,
    instance: &ResourceInstance,
    known: &[&str],
) -> ModuleResult<()> {
    match instance.keys().find(|f| !known.contains(&f.as_str())) {
        None => Ok(()),
        Some(field) => Err(ModuleError::validation(
            resource,
            format!("unsupported field '{}' in {}", field, key),
        )),
    }
}
