//! `awplus_lag_interfaces`: dynamic (LACP) channel groups
//!
//! A group is keyed by its aggregator name (`po1`). Membership is configured on each
//! member port with `channel-group <n> mode <active|passive>`, so every member gets its
//! own `interface` context. A port can belong to at most one group; a want that lists
//! the same port twice is rejected before any command is produced. A port moving between
//! groups leaves its old group before joining the new one.

use super::{check_choice, check_known_fields, items, value_text};
use crate::modules::network::engine::{
    CommandBuffer, FieldRule, Mode, OrderingRules, OverrideOrder, ResourceSpec, Scope,
};
use crate::modules::network::model::{ResourceCollection, ResourceInstance};
use crate::modules::{ModuleError, ModuleResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

const RESOURCE: &str = "lag_interfaces";
const DEFAULT_MODE: &str = "active";

static AGGREGATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^po(\d+)$").expect("Invalid aggregator regex"));

static PORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^port\d+\.\d+\.\d+$").expect("Invalid port regex"));

fn group_number(key: &str) -> &str {
    key.trim_start_matches("po")
}

fn member_name(member: &Value) -> String {
    member.get("member").map(value_text).unwrap_or_default()
}

fn member_mode(member: &Value) -> String {
    member
        .get("mode")
        .map(value_text)
        .unwrap_or_else(|| DEFAULT_MODE.to_string())
}

/// Group that lists `port` as a member
fn owner<'a>(groups: &'a ResourceCollection, port: &str) -> Option<&'a str> {
    groups.iter().find_map(|(key, group)| {
        group
            .get("members")
            .into_iter()
            .flat_map(items)
            .any(|m| member_name(m) == port)
            .then_some(key)
    })
}

pub struct LagInterfaces;

impl LagInterfaces {
    fn members_rule(&self) -> FieldRule {
        FieldRule::new(
            "members",
            |key: &str, member: &Value| {
                vec![format!(
                    "channel-group {} mode {}",
                    group_number(key),
                    member_mode(member)
                )]
            },
            |_, _| vec!["no channel-group".to_string()],
        )
        .negate_first()
        .identified_by("member")
    }
}

impl ResourceSpec for LagInterfaces {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![self.members_rule()]
    }

    fn normalize(&self, instance: &mut ResourceInstance) {
        if let Some(Value::Array(members)) = instance.get_mut("members") {
            for member in members.iter_mut() {
                if let Value::Object(map) = member {
                    map.entry("mode")
                        .or_insert_with(|| Value::from(DEFAULT_MODE));
                }
            }
        }
    }

    fn ordering(&self) -> OrderingRules {
        OrderingRules {
            override_order: OverrideOrder::RemoveThenUpdate,
            ..OrderingRules::default()
        }
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["name", "members"])?;
        let group = AGGREGATOR_REGEX
            .captures(key)
            .and_then(|c| c[1].parse::<u32>().ok())
            .ok_or_else(|| {
                ModuleError::validation(RESOURCE, format!("'{}' is not an aggregator name (poN)", key))
            })?;
        if !(1..=248).contains(&group) {
            return Err(ModuleError::validation(
                RESOURCE,
                format!("channel group of {} must be between 1 and 248", key),
            ));
        }

        for member in want.get("members").into_iter().flat_map(items) {
            let Value::Object(map) = member else {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("members of {} must be mappings", key),
                ));
            };
            let fields: ResourceInstance = map.clone().into_iter().collect();
            check_known_fields(RESOURCE, key, &fields, &["member", "mode"])?;
            check_choice(RESOURCE, key, &fields, "mode", &["active", "passive"])?;
            let name = member_name(member);
            if !PORT_REGEX.is_match(&name) {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("member '{}' of {} is not a switch port", name, key),
                ));
            }
        }
        Ok(())
    }

    fn validate_collection(&self, want: &ResourceCollection) -> ModuleResult<()> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        for (key, instance) in want.iter() {
            for member in instance.get("members").into_iter().flat_map(items) {
                let name = member_name(member);
                if let Some(previous) = owners.insert(name.clone(), key) {
                    return Err(ModuleError::conflict(
                        RESOURCE,
                        format!("{} is listed as a member of both {} and {}", name, previous, key),
                    ));
                }
            }
        }
        Ok(())
    }

    fn render_set(
        &self,
        key: &str,
        changes: &ResourceInstance,
        _want: &ResourceInstance,
        _have: Option<&ResourceInstance>,
        scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let rule = self.members_rule();
        for member in changes.get(rule.name).into_iter().flat_map(items) {
            let name = member_name(member);
            let context = format!("interface {}", name);
            // the port may sit in this group with another mode, or in another group
            if let Some(current) = owner(scope.have, &name) {
                debug!(resource = RESOURCE, port = %name, from = current, to = key, "regrouping port");
                out.extend(Some(context.as_str()), (rule.clear)(key, member));
            }
            out.extend(Some(context.as_str()), (rule.set)(key, member));
        }
    }

    /// Members that some group in `want` takes over are left to `render_set`
    fn render_clear(
        &self,
        key: &str,
        clears: &ResourceInstance,
        _have: &ResourceInstance,
        _want: Option<&ResourceInstance>,
        scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let rule = self.members_rule();
        for member in clears.get(rule.name).into_iter().flat_map(items) {
            let name = member_name(member);
            if scope.mode != Mode::Deleted && owner(scope.want, &name).is_some() {
                continue;
            }
            let context = format!("interface {}", name);
            out.extend(Some(context.as_str()), (rule.clear)(key, member));
        }
    }
}
