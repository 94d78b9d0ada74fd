//! `awplus_static_routes`: IPv4 static routes, one entry per destination prefix

use super::{check_known_fields, check_value_range, items, validate_interface_name, value_text};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;
use std::net::Ipv4Addr;

const RESOURCE: &str = "static_routes";
const DEFAULT_DISTANCE: i64 = 1;

fn route_line(dest: &str, hop: &Value) -> String {
    let address = hop.get("forward_router_address").map(value_text).unwrap_or_default();
    match hop.get("admin_distance").and_then(Value::as_i64) {
        Some(distance) if distance != DEFAULT_DISTANCE => {
            format!("ip route {} {} {}", dest, address, distance)
        }
        _ => format!("ip route {} {}", dest, address),
    }
}

fn negate_route(dest: &str, hop: &Value) -> String {
    let address = hop.get("forward_router_address").map(value_text).unwrap_or_default();
    format!("no ip route {} {}", dest, address)
}

fn is_prefix(dest: &str) -> bool {
    let Some((address, length)) = dest.split_once('/') else {
        return false;
    };
    address.parse::<Ipv4Addr>().is_ok() && length.parse::<u8>().is_ok_and(|l| l <= 32)
}

pub struct StaticRoutes;

impl ResourceSpec for StaticRoutes {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "dest"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![FieldRule::new(
            "next_hops",
            |dest: &str, v: &Value| items(v).map(|hop| route_line(dest, hop)).collect(),
            |dest: &str, v: &Value| items(v).map(|hop| negate_route(dest, hop)).collect(),
        )
        .identified_by("forward_router_address")]
    }

    fn normalize(&self, instance: &mut ResourceInstance) {
        if let Some(Value::Array(hops)) = instance.get_mut("next_hops") {
            for hop in hops.iter_mut() {
                if let Value::Object(map) = hop {
                    map.entry("admin_distance")
                        .or_insert_with(|| Value::from(DEFAULT_DISTANCE));
                }
            }
        }
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["dest", "next_hops"])?;
        if !is_prefix(key) {
            return Err(ModuleError::validation(
                RESOURCE,
                format!("destination '{}' must be an IPv4 prefix such as 10.0.0.0/8", key),
            ));
        }
        if let Some(hops) = want.get("next_hops") {
            if !hops.is_array() {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("next_hops of {} must be a list", key),
                ));
            }
        }
        for hop in want.get("next_hops").into_iter().flat_map(items) {
            let address = hop.get("forward_router_address").map(value_text).unwrap_or_default();
            if address.parse::<Ipv4Addr>().is_err() {
                validate_interface_name(RESOURCE, &address).map_err(|_| {
                    ModuleError::validation(
                        RESOURCE,
                        format!("next hop '{}' of {} is neither an address nor an interface", address, key),
                    )
                })?;
            }
            if let Some(distance) = hop.get("admin_distance") {
                check_value_range(RESOURCE, key, "admin_distance", distance, 1, 255)?;
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
        let want = ResourceCollection::from_value(&StaticRoutes, Some(&want))?;
        let have = ResourceCollection::from_value(&StaticRoutes, Some(&have))?;
        reconcile(&StaticRoutes, &want, &have, mode)
    }

    fn have() -> Value {
        json!([
            {"dest": "0.0.0.0/0", "next_hops": [{"forward_router_address": "192.168.1.1"}]},
            {"dest": "10.0.0.0/8", "next_hops": [
                {"forward_router_address": "192.168.1.2", "admin_distance": 10}
            ]}
        ])
    }

    #[test]
    fn test_default_distance_is_implicit() {
        let want = json!([{"dest": "0.0.0.0/0", "next_hops": [
            {"forward_router_address": "192.168.1.1", "admin_distance": 1}
        ]}]);
        assert!(run(want, have(), Mode::Merged).unwrap().is_empty());
    }

    #[test]
    fn test_merged_adds_backup_hop() {
        let want = json!([{"dest": "0.0.0.0/0", "next_hops": [
            {"forward_router_address": "192.168.2.1", "admin_distance": 200}
        ]}]);
        assert_eq!(
            run(want, have(), Mode::Merged).unwrap(),
            vec!["ip route 0.0.0.0/0 192.168.2.1 200"]
        );
    }

    #[test]
    fn test_overridden_removes_other_prefixes() {
        let want = json!([{"dest": "0.0.0.0/0", "next_hops": [{"forward_router_address": "192.168.1.1"}]}]);
        assert_eq!(
            run(want, have(), Mode::Overridden).unwrap(),
            vec!["no ip route 10.0.0.0/8 192.168.1.2"]
        );
    }

    #[test]
    fn test_deleted_by_next_hop_address() {
        let want = json!([{"dest": "10.0.0.0/8", "next_hops": [{"forward_router_address": "192.168.1.2"}]}]);
        assert_eq!(
            run(want, have(), Mode::Deleted).unwrap(),
            vec!["no ip route 10.0.0.0/8 192.168.1.2"]
        );
    }

    #[test]
    fn test_validation() {
        assert!(run(json!([{"dest": "10.0.0.0"}]), json!([]), Mode::Merged).is_err());
        assert!(run(json!([{"dest": "10.0.0.0/33"}]), json!([]), Mode::Merged).is_err());
        let bad_hop = json!([{"dest": "10.0.0.0/8", "next_hops": [{"forward_router_address": "gateway"}]}]);
        assert!(run(bad_hop, json!([]), Mode::Merged).is_err());
        let bad_distance = json!([{"dest": "10.0.0.0/8", "next_hops": [
            {"forward_router_address": "vlan10", "admin_distance": 300}
        ]}]);
        assert!(run(bad_distance, json!([]), Mode::Merged).is_err());
    }
}
