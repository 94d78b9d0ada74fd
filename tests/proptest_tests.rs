//! Property-based tests for the reconciliation engine using proptest.
//!
//! Random collections are generated for a couple of representative resources and run
//! through every state, checking the laws every resource module must obey.

mod common;

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use proptest::sample::subsequence;
use serde_json::{json, Value};

use awplus::modules::network::awplus::static_routes::StaticRoutes;
use awplus::modules::network::awplus::vlans::Vlans;
use awplus::modules::network::{
    network_module_names, reconcile, Mode, ResourceCollection, ResourceSpec, SaveWhen,
};
use awplus::modules::ModuleRegistry;
use common::{context_with, params, MockReader};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// A VLAN table: unique ids, optional names and states
fn vlan_table() -> impl Strategy<Value = Value> {
    let entry = (
        prop::option::of("[a-z][a-z0-9_]{0,11}"),
        prop::option::of(prop_oneof![Just("enable"), Just("disable")]),
    );
    btree_map(1u32..4095, entry, 1..8).prop_map(|vlans| {
        Value::Array(
            vlans
                .into_iter()
                .map(|(id, (name, state))| {
                    let mut vlan = json!({"vlan_id": id});
                    if let Some(name) = name {
                        vlan["name"] = Value::from(name);
                    }
                    if let Some(state) = state {
                        vlan["state"] = Value::from(state);
                    }
                    vlan
                })
                .collect(),
        )
    })
}

/// A static route table over a small pool of prefixes and next hops
fn route_table() -> impl Strategy<Value = Value> {
    let prefixes = vec!["0.0.0.0/0", "10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"];
    let hops = vec!["192.168.1.1", "192.168.1.2", "10.1.1.1", "vlan10"];
    let route = (subsequence(hops, 1..=3), vec(1u8..=255, 3));
    (subsequence(prefixes, 1..=4), vec(route, 4)).prop_map(|(dests, routes)| {
        Value::Array(
            dests
                .into_iter()
                .zip(routes)
                .map(|(dest, (addresses, distances))| {
                    let next_hops: Vec<Value> = addresses
                        .into_iter()
                        .zip(distances)
                        .map(|(address, distance)| {
                            json!({"forward_router_address": address, "admin_distance": distance})
                        })
                        .collect();
                    json!({"dest": dest, "next_hops": next_hops})
                })
                .collect(),
        )
    })
}

fn commands<R: ResourceSpec>(spec: &R, want: &Value, have: &Value, mode: Mode) -> Vec<String> {
    let want = ResourceCollection::from_value(spec, Some(want)).unwrap();
    let have = ResourceCollection::from_value(spec, Some(have)).unwrap();
    reconcile(spec, &want, &have, mode).unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_vlans_matching_state_is_idempotent(table in vlan_table()) {
        for mode in [Mode::Merged, Mode::Replaced, Mode::Overridden] {
            prop_assert!(
                commands(&Vlans, &table, &table, mode).is_empty(),
                "{} was not idempotent",
                mode
            );
        }
    }

    #[test]
    fn prop_routes_matching_state_is_idempotent(table in route_table()) {
        for mode in [Mode::Merged, Mode::Replaced, Mode::Overridden] {
            prop_assert!(commands(&StaticRoutes, &table, &table, mode).is_empty());
        }
    }

    #[test]
    fn prop_merged_never_removes(want in vlan_table(), have in vlan_table()) {
        for line in commands(&Vlans, &want, &have, Mode::Merged) {
            prop_assert!(!line.starts_with("no "), "merged emitted {}", line);
        }
    }

    #[test]
    fn prop_merged_routes_never_remove(want in route_table(), have in route_table()) {
        for line in commands(&StaticRoutes, &want, &have, Mode::Merged) {
            prop_assert!(!line.starts_with("no "), "merged emitted {}", line);
        }
    }

    #[test]
    fn prop_overridden_contains_replaced(want in route_table(), have in route_table()) {
        let replaced = commands(&StaticRoutes, &want, &have, Mode::Replaced);
        let overridden = commands(&StaticRoutes, &want, &have, Mode::Overridden);
        for line in &replaced {
            prop_assert!(overridden.contains(line), "{} missing from overridden", line);
        }
    }

    #[test]
    fn prop_deleted_everything_removes_every_route(have in route_table()) {
        let removed = commands(&StaticRoutes, &json!([]), &have, Mode::Deleted);
        let hops: usize = have
            .as_array()
            .map(|routes| routes.iter().map(|r| r["next_hops"].as_array().map_or(0, Vec::len)).sum())
            .unwrap_or(0);
        prop_assert_eq!(removed.len(), hops);
        prop_assert!(removed.iter().all(|line| line.starts_with("no ip route ")));
    }

    #[test]
    fn prop_deleted_everything_spares_vlan_1(have in vlan_table()) {
        let removed = commands(&Vlans, &json!([]), &have, Mode::Deleted);
        let removable = have
            .as_array()
            .map(|vlans| vlans.iter().filter(|v| v["vlan_id"] != json!(1)).count())
            .unwrap_or(0);
        prop_assert!(!removed.iter().any(|line| line == "no vlan 1"));
        let expected = if removable == 0 { 0 } else { removable + 1 };
        prop_assert_eq!(removed.len(), expected);
    }
}

// ============================================================================
// Laws over every registered module
// ============================================================================

#[test]
fn test_deleting_nothing_from_nothing_is_empty_for_every_module() {
    let registry = ModuleRegistry::with_builtins();

    for name in network_module_names() {
        let (ctx, _, sink) = context_with(MockReader::new(), SaveWhen::Never);
        let output = registry
            .execute(name, &params(json!({"state": "deleted"})), &ctx)
            .unwrap();

        assert!(!output.changed, "{} changed an empty device", name);
        assert!(sink.is_empty());
    }
}
