//! `awplus_vlans`: VLANs in the VLAN database
//!
//! ```yaml
//! - awplus_vlans:
//!     config:
//!       - vlan_id: 100
//!         name: servers
//!       - vlan_id: 200
//!         state: disable
//!     state: merged
//! ```
//!
//! VLAN 1 always exists and is never removed. `overridden` only reconciles VLANs the
//! switch already has; it removes extras but does not create missing ones.

use super::{check_choice, check_known_fields, check_range, value_text};
use crate::modules::network::engine::{
    CommandBuffer, FieldRule, OrderingRules, ResourceSpec, Scope,
};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;

const RESOURCE: &str = "vlans";
const CONTEXT: &str = "vlan database";
const DEFAULT_VLAN: &str = "1";

/// Name AW+ gives a VLAN created without one
fn default_name(vlan_id: &str) -> String {
    format!("VLAN{:0>4}", vlan_id)
}

pub struct Vlans;

impl ResourceSpec for Vlans {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "vlan_id"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "name",
                |id: &str, v: &Value| vec![format!("vlan {} name {}", id, value_text(v))],
                |id: &str, v: &Value| {
                    if value_text(v) == default_name(id) {
                        Vec::new()
                    } else {
                        vec![format!("vlan {} name {}", id, default_name(id))]
                    }
                },
            ),
            FieldRule::new(
                "state",
                |id: &str, v: &Value| vec![format!("vlan {} state {}", id, value_text(v))],
                |id: &str, v: &Value| match v.as_str() {
                    Some("disable") => vec![format!("vlan {} state enable", id)],
                    _ => Vec::new(),
                },
            ),
        ]
    }

    fn context(&self, _key: &str) -> Option<String> {
        Some(CONTEXT.to_string())
    }

    fn ordering(&self) -> OrderingRules {
        OrderingRules {
            override_creates: false,
            ..OrderingRules::default()
        }
    }

    fn is_protected(&self, key: &str, _have: &ResourceInstance) -> bool {
        key == DEFAULT_VLAN
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["vlan_id", "name", "state"])?;
        check_range(RESOURCE, key, want, "vlan_id", 1, 4094)?;
        check_choice(RESOURCE, key, want, "state", &["enable", "disable"])?;
        if let Some(name) = want.get("name") {
            let valid = name
                .as_str()
                .is_some_and(|n| !n.is_empty() && n.len() <= 32 && !n.contains(char::is_whitespace));
            if !valid {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("name of VLAN {} must be 1-32 characters without spaces", key),
                ));
            }
        }
        Ok(())
    }

    fn render_set(
        &self,
        key: &str,
        changes: &ResourceInstance,
        _want: &ResourceInstance,
        have: Option<&ResourceInstance>,
        _scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        if have.is_none() && !changes.contains_key("name") {
            out.push(Some(CONTEXT), format!("vlan {}", key));
        }
        for rule in self.fields() {
            if let Some(value) = changes.get(rule.name) {
                out.extend(Some(CONTEXT), (rule.set)(key, value));
            }
        }
    }

    fn render_remove(
        &self,
        key: &str,
        _have: &ResourceInstance,
        _scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        out.push(Some(CONTEXT), format!("no vlan {}", key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&Vlans, Some(&want))?;
        let have = ResourceCollection::from_value(&Vlans, Some(&have))?;
        reconcile(&Vlans, &want, &have, mode)
    }

    fn have() -> Value {
        json!([
            {"vlan_id": 1, "name": "default", "state": "enable"},
            {"vlan_id": 100, "name": "VLAN0100", "state": "enable"}
        ])
    }

    #[test]
    fn test_overridden_removes_but_does_not_create() {
        let want = json!([
            {"vlan_id": 1, "name": "default", "state": "enable"},
            {"vlan_id": 2, "name": "vlan2", "state": "enable"}
        ]);
        assert_eq!(
            run(want, have(), Mode::Overridden).unwrap(),
            vec!["vlan database", "no vlan 100"]
        );
    }

    #[test]
    fn test_merged_creates_with_and_without_name() {
        let want = json!([{"vlan_id": 20, "name": "voice"}, {"vlan_id": 30, "state": "disable"}]);
        assert_eq!(
            run(want, have(), Mode::Merged).unwrap(),
            vec!["vlan database", "vlan 20 name voice", "vlan 30", "vlan 30 state disable"]
        );
    }

    #[test]
    fn test_replaced_restores_defaults() {
        let have = json!([{"vlan_id": 100, "name": "old", "state": "disable"}]);
        assert_eq!(
            run(json!([{"vlan_id": 100}]), have, Mode::Replaced).unwrap(),
            vec!["vlan database", "vlan 100 name VLAN0100", "vlan 100 state enable"]
        );
    }

    #[test]
    fn test_replaced_with_default_name_is_idempotent() {
        assert!(run(json!([{"vlan_id": 100}]), have(), Mode::Replaced).unwrap().is_empty());
    }

    #[test]
    fn test_deleted_never_touches_vlan_1() {
        assert_eq!(
            run(json!([]), have(), Mode::Deleted).unwrap(),
            vec!["vlan database", "no vlan 100"]
        );
        assert!(run(json!([{"vlan_id": 1}]), have(), Mode::Deleted).unwrap().is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(run(json!([{"vlan_id": 4095}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"vlan_id": 5, "state": "up"}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"vlan_id": 5, "name": "two words"}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"vlan_id": 5, "mtu": 1500}]), json!([]), Mode::Merged).is_err());
        let dup = run(json!([{"vlan_id": 5}, {"vlan_id": 5}]), json!([]), Mode::Merged);
        assert!(matches!(dup, Err(ModuleError::DuplicateKey { .. })));
    }
}
