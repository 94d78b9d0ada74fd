//! `awplus_lacp_interfaces`: per-port LACP priority and timeout

use super::{
    check_choice, check_known_fields, check_range, interface_context, validate_interface_name,
    value_text,
};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::ModuleResult;
use serde_json::Value;

const RESOURCE: &str = "lacp_interfaces";

pub struct LacpInterfaces;

impl ResourceSpec for LacpInterfaces {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "port_priority",
                |_, v: &Value| vec![format!("lacp port-priority {}", value_text(v))],
                |_, _| vec!["no lacp port-priority".to_string()],
            ),
            FieldRule::new(
                "timeout",
                |_, v: &Value| vec![format!("lacp timeout {}", value_text(v))],
                |_, v: &Value| match v.as_str() {
                    Some("long") => Vec::new(),
                    _ => vec!["lacp timeout long".to_string()],
                },
            ),
        ]
    }

    fn context(&self, key: &str) -> Option<String> {
        interface_context(key)
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["name", "port_priority", "timeout"])?;
        validate_interface_name(RESOURCE, key)?;
        check_range(RESOURCE, key, want, "port_priority", 1, 65535)?;
        check_choice(RESOURCE, key, want, "timeout", &["short", "long"])
    }
}
