//! `awplus_interfaces`: description, admin state, speed, duplex and MTU of an interface

use super::{
    check_bool, check_choice, check_known_fields, check_range, interface_context,
    validate_interface_name, value_text,
};
use crate::modules::network::engine::{FieldRule, OrderingRules, OverrideOrder, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;

const RESOURCE: &str = "interfaces";
const SPEEDS: &[&str] = &["auto", "10", "100", "1000", "2500", "5000", "10000", "40000", "100000"];

pub struct Interfaces;

impl ResourceSpec for Interfaces {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "description",
                |_, v: &Value| vec![format!("description {}", value_text(v))],
                |_, _| vec!["no description".to_string()],
            ),
            FieldRule::new(
                "speed",
                |_, v: &Value| vec![format!("speed {}", value_text(v))],
                |_, _| vec!["no speed".to_string()],
            ),
            FieldRule::new(
                "duplex",
                |_, v: &Value| vec![format!("duplex {}", value_text(v))],
                |_, _| vec!["no duplex".to_string()],
            ),
            FieldRule::new(
                "mtu",
                |_, v: &Value| vec![format!("mtu {}", value_text(v))],
                |_, _| vec!["no mtu".to_string()],
            ),
            FieldRule::new(
                "enabled",
                |_, v: &Value| match v.as_bool() {
                    Some(false) => vec!["shutdown".to_string()],
                    _ => vec!["no shutdown".to_string()],
                },
                // interfaces come up enabled by default
                |_, v: &Value| match v.as_bool() {
                    Some(false) => vec!["no shutdown".to_string()],
                    _ => Vec::new(),
                },
            ),
        ]
    }

    fn context(&self, key: &str) -> Option<String> {
        interface_context(key)
    }

    fn ordering(&self) -> OrderingRules {
        OrderingRules {
            override_order: OverrideOrder::Interleaved,
            ..OrderingRules::default()
        }
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(
            RESOURCE,
            key,
            want,
            &["name", "description", "enabled", "speed", "duplex", "mtu"],
        )?;
        validate_interface_name(RESOURCE, key)?;
        check_bool(RESOURCE, key, want, "enabled")?;
        check_choice(RESOURCE, key, want, "duplex", &["auto", "full", "half"])?;
        check_range(RESOURCE, key, want, "mtu", 68, 9582)?;
        if let Some(speed) = want.get("speed") {
            if !SPEEDS.contains(&value_text(speed).as_str()) {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("speed of {} must be one of {}, got {}", key, SPEEDS.join(", "), speed),
                ));
            }
        }
        if let Some(description) = want.get("description") {
            if !description.is_string() {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("description of {} must be a string", key),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&Interfaces, Some(&want))?;
        let have = ResourceCollection::from_value(&Interfaces, Some(&have))?;
        reconcile(&Interfaces, &want, &have, mode)
    }

    #[test]
    fn test_replaced_only_description_differs() {
        let have = json!([{"name": "port1.6.5", "description": "old", "enabled": true, "speed": "1000"}]);
        let want = json!([{"name": "port1.6.5", "description": "new description", "enabled": true, "speed": "1000"}]);
        assert_eq!(
            run(want, have, Mode::Replaced).unwrap(),
            vec!["interface port1.6.5", "description new description"]
        );
    }

    #[test]
    fn test_merged_shutdown_and_speed() {
        let have = json!([{"name": "port1.0.1", "enabled": true}]);
        let want = json!([{"name": "port1.0.1", "enabled": false, "speed": 1000, "mtu": 9000}]);
        assert_eq!(
            run(want, have, Mode::Merged).unwrap(),
            vec!["interface port1.0.1", "speed 1000", "mtu 9000", "shutdown"]
        );
    }

    #[test]
    fn test_overridden_interleaves_in_device_order() {
        let have = json!([
            {"name": "port1.0.1", "description": "uplink"},
            {"name": "port1.0.2", "description": "spare", "enabled": false},
            {"name": "port1.0.3", "mtu": 1500}
        ]);
        let want = json!([
            {"name": "port1.0.3", "mtu": 9000},
            {"name": "port1.0.1", "description": "core"}
        ]);
        assert_eq!(
            run(want, have, Mode::Overridden).unwrap(),
            vec![
                "interface port1.0.1",
                "description core",
                "interface port1.0.2",
                "no description",
                "no shutdown",
                "interface port1.0.3",
                "mtu 9000",
            ]
        );
    }

    #[test]
    fn test_deleted_single_field() {
        let have = json!([{"name": "port1.0.1", "description": "uplink", "mtu": 9000}]);
        assert_eq!(
            run(json!([{"name": "port1.0.1", "mtu": 9000}]), have, Mode::Deleted).unwrap(),
            vec!["interface port1.0.1", "no mtu"]
        );
    }

    #[test]
    fn test_validation() {
        assert!(run(json!([{"name": "Gi0/1"}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"name": "port1.0.1", "mtu": 20}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"name": "port1.0.1", "speed": "fast"}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"name": "port1.0.1", "enabled": "yes"}]), json!([]), Mode::Merged).is_err());
    }
}
