//! `awplus_l2_interfaces`: switchport access and trunk membership
//!
//! Trunk VLAN lists are reconciled element by element, so `merged` only ever adds VLANs
//! and `replaced` removes the ones that are no longer wanted. An empty `allowed_vlans`
//! list under `replaced` removes them all.

use super::{
    check_known_fields, check_value_range, interface_context, items, validate_interface_name,
    value_text,
};
use crate::modules::network::engine::{CommandBuffer, FieldRule, ResourceSpec, Scope};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;

const RESOURCE: &str = "l2_interfaces";

fn render_access(_key: &str, v: &Value) -> Vec<String> {
    v.get("vlan")
        .map(|vlan| vec![format!("switchport access vlan {}", value_text(vlan))])
        .unwrap_or_default()
}

fn clear_access(_key: &str, v: &Value) -> Vec<String> {
    if v.get("vlan").is_some() {
        vec!["no switchport access vlan".to_string()]
    } else {
        Vec::new()
    }
}

fn render_trunk(_key: &str, v: &Value) -> Vec<String> {
    let mut lines: Vec<String> = v
        .get("allowed_vlans")
        .into_iter()
        .flat_map(items)
        .map(|vlan| format!("switchport trunk allowed vlan add {}", value_text(vlan)))
        .collect();
    if let Some(native) = v.get("native_vlan") {
        lines.push(format!("switchport trunk native vlan {}", value_text(native)));
    }
    lines
}

fn clear_trunk(_key: &str, v: &Value) -> Vec<String> {
    let mut lines: Vec<String> = v
        .get("allowed_vlans")
        .into_iter()
        .flat_map(items)
        .map(|vlan| format!("switchport trunk allowed vlan remove {}", value_text(vlan)))
        .collect();
    if v.get("native_vlan").is_some() {
        lines.push("no switchport trunk native vlan".to_string());
    }
    lines
}

pub struct L2Interfaces;

impl ResourceSpec for L2Interfaces {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new("access", render_access, clear_access),
            FieldRule::new("trunk", render_trunk, clear_trunk),
        ]
    }

    fn context(&self, key: &str) -> Option<String> {
        interface_context(key)
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["name", "access", "trunk"])?;
        validate_interface_name(RESOURCE, key)?;
        if want.contains_key("access") && want.contains_key("trunk") {
            return Err(ModuleError::validation(
                RESOURCE,
                format!("{} cannot be both an access and a trunk port", key),
            ));
        }
        if let Some(access) = want.get("access") {
            if let Some(vlan) = access.get("vlan") {
                check_value_range(RESOURCE, key, "access.vlan", vlan, 1, 4094)?;
            }
        }
        if let Some(trunk) = want.get("trunk") {
            for vlan in trunk.get("allowed_vlans").into_iter().flat_map(items) {
                check_value_range(RESOURCE, key, "trunk.allowed_vlans", vlan, 1, 4094)?;
            }
            if let Some(native) = trunk.get("native_vlan") {
                check_value_range(RESOURCE, key, "trunk.native_vlan", native, 1, 4094)?;
            }
        }
        Ok(())
    }

    /// Sets the switchport mode before the first access or trunk setting on a port
    fn render_set(
        &self,
        key: &str,
        changes: &ResourceInstance,
        _want: &ResourceInstance,
        have: Option<&ResourceInstance>,
        _scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let context = self.context(key);
        for rule in self.fields() {
            let Some(value) = changes.get(rule.name) else {
                continue;
            };
            if !have.is_some_and(|h| h.contains_key(rule.name)) {
                out.push(context.as_deref(), format!("switchport mode {}", rule.name));
            }
            out.extend(context.as_deref(), (rule.set)(key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&L2Interfaces, Some(&want))?;
        let have = ResourceCollection::from_value(&L2Interfaces, Some(&have))?;
        reconcile(&L2Interfaces, &want, &have, mode)
    }

    fn trunk_have() -> Value {
        json!([{"name": "port1.0.2", "trunk": {"allowed_vlans": [10, 20], "native_vlan": 1}}])
    }

    #[test]
    fn test_merged_adds_only_missing_vlans() {
        let want = json!([{"name": "port1.0.2", "trunk": {"allowed_vlans": [20, 30]}}]);
        assert_eq!(
            run(want, trunk_have(), Mode::Merged).unwrap(),
            vec!["interface port1.0.2", "switchport trunk allowed vlan add 30"]
        );
    }

    #[test]
    fn test_replaced_empty_list_clears_allowed_vlans() {
        let want = json!([{"name": "port1.0.2", "trunk": {"allowed_vlans": [], "native_vlan": 1}}]);
        assert_eq!(
            run(want, trunk_have(), Mode::Replaced).unwrap(),
            vec![
                "interface port1.0.2",
                "switchport trunk allowed vlan remove 10",
                "switchport trunk allowed vlan remove 20",
            ]
        );
    }

    #[test]
    fn test_merged_with_empty_list_is_noop() {
        let want = json!([{"name": "port1.0.2", "trunk": {"allowed_vlans": []}}]);
        assert!(run(want, trunk_have(), Mode::Merged).unwrap().is_empty());
    }

    #[test]
    fn test_replaced_access_to_trunk() {
        let have = json!([{"name": "port1.0.3", "access": {"vlan": 10}}]);
        let want = json!([{"name": "port1.0.3", "trunk": {"allowed_vlans": [10], "native_vlan": 5}}]);
        assert_eq!(
            run(want, have, Mode::Replaced).unwrap(),
            vec![
                "interface port1.0.3",
                "no switchport access vlan",
                "switchport mode trunk",
                "switchport trunk allowed vlan add 10",
                "switchport trunk native vlan 5",
            ]
        );
    }

    #[test]
    fn test_new_access_port() {
        let want = json!([{"name": "port1.0.4", "access": {"vlan": 30}}]);
        assert_eq!(
            run(want, json!([]), Mode::Merged).unwrap(),
            vec!["interface port1.0.4", "switchport mode access", "switchport access vlan 30"]
        );
    }

    #[test]
    fn test_deleted_named_vlan() {
        let want = json!([{"name": "port1.0.2", "trunk": {"allowed_vlans": [20, 99]}}]);
        assert_eq!(
            run(want, trunk_have(), Mode::Deleted).unwrap(),
            vec!["interface port1.0.2", "switchport trunk allowed vlan remove 20"]
        );
    }

    #[test]
    fn test_validation() {
        let both = json!([{"name": "port1.0.1", "access": {"vlan": 1}, "trunk": {"native_vlan": 1}}]);
        assert!(run(both, json!([]), Mode::Merged).is_err());
        let bad_vlan = json!([{"name": "port1.0.1", "trunk": {"allowed_vlans": [0]}}]);
        assert!(run(bad_vlan, json!([]), Mode::Merged).is_err());
    }
}
