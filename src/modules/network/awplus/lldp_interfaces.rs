//! `awplus_lldp_interfaces`: LLDP transmit and receive per port
//!
//! Both directions are enabled by default, so clearing a field re-enables it.

use super::{check_bool, check_known_fields, interface_context, validate_interface_name};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::ModuleResult;
use serde_json::Value;

const RESOURCE: &str = "lldp_interfaces";

fn toggle(keyword: &str, enabled: bool) -> Vec<String> {
    if enabled {
        vec![format!("lldp {}", keyword)]
    } else {
        vec![format!("no lldp {}", keyword)]
    }
}

pub struct LldpInterfaces;

impl ResourceSpec for LldpInterfaces {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "receive",
                |_, v: &Value| toggle("receive", v.as_bool().unwrap_or(true)),
                |_, v: &Value| match v.as_bool() {
                    Some(false) => toggle("receive", true),
                    _ => Vec::new(),
                },
            ),
            FieldRule::new(
                "transmit",
                |_, v: &Value| toggle("transmit", v.as_bool().unwrap_or(true)),
                |_, v: &Value| match v.as_bool() {
                    Some(false) => toggle("transmit", true),
                    _ => Vec::new(),
                },
            ),
        ]
    }

    fn context(&self, key: &str) -> Option<String> {
        interface_context(key)
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["name", "receive", "transmit"])?;
        validate_interface_name(RESOURCE, key)?;
        check_bool(RESOURCE, key, want, "receive")?;
        check_bool(RESOURCE, key, want, "transmit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&LldpInterfaces, Some(&want))?;
        let have = ResourceCollection::from_value(&LldpInterfaces, Some(&have))?;
        reconcile(&LldpInterfaces, &want, &have, mode)
    }

    #[test]
    fn test_merged_disables_receive() {
        let have = json!([{"name": "port1.0.1", "receive": true, "transmit": true}]);
        let want = json!([{"name": "port1.0.1", "receive": false}]);
        assert_eq!(
            run(want, have, Mode::Merged).unwrap(),
            vec!["interface port1.0.1", "no lldp receive"]
        );
    }

    #[test]
    fn test_deleted_reenables() {
        let have = json!([
            {"name": "port1.0.1", "receive": false, "transmit": true},
            {"name": "port1.0.2", "transmit": false}
        ]);
        assert_eq!(
            run(json!([]), have, Mode::Deleted).unwrap(),
            vec![
                "interface port1.0.1",
                "lldp receive",
                "interface port1.0.2",
                "lldp transmit",
            ]
        );
    }

    #[test]
    fn test_validation() {
        let want = json!([{"name": "port1.0.1", "receive": "off"}]);
        assert!(run(want, json!([]), Mode::Merged).is_err());
    }
}
