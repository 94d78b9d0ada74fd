//! `awplus_ntp`: NTP servers, peers and source interface

use super::{check_known_fields, items, validate_interface_name, value_text};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;

const RESOURCE: &str = "ntp";

pub struct Ntp;

impl ResourceSpec for Ntp {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "global"
    }

    fn is_global(&self) -> bool {
        true
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "servers",
                |_, v: &Value| items(v).map(|s| format!("ntp server {}", value_text(s))).collect(),
                |_, v: &Value| items(v).map(|s| format!("no ntp server {}", value_text(s))).collect(),
            ),
            FieldRule::new(
                "peers",
                |_, v: &Value| items(v).map(|p| format!("ntp peer {}", value_text(p))).collect(),
                |_, v: &Value| items(v).map(|p| format!("no ntp peer {}", value_text(p))).collect(),
            ),
            FieldRule::new(
                "source_interface",
                |_, v: &Value| vec![format!("ntp source {}", value_text(v))],
                |_, _| vec!["no ntp source".to_string()],
            ),
        ]
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["global", "servers", "peers", "source_interface"])?;
        for field in ["servers", "peers"] {
            let Some(value) = want.get(field) else {
                continue;
            };
            let valid = value.as_array().is_some_and(|list| {
                list.iter()
                    .all(|host| host.as_str().is_some_and(|h| !h.trim().is_empty() && !h.contains(' ')))
            });
            if !valid {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("{} must be a list of host names or addresses", field),
                ));
            }
        }
        if let Some(source) = want.get("source_interface") {
            validate_interface_name(RESOURCE, &value_text(source))?;
        }
        Ok(())
    }
}
