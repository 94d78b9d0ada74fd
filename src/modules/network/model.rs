//! Resource model and state comparator
//!
//! A resource instance is an ordered mapping from field name to JSON value. A field that
//! is absent from the mapping is *unset*: the caller said nothing about it and it must be
//! left alone. A field holding an empty list or mapping is *empty*: the caller asked for
//! it to be cleared. Explicit `null` values are dropped on the way in, so `null` and
//! "not specified" mean the same thing.

use super::engine::ResourceSpec;
use crate::modules::{ModuleError, ModuleResult};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Key used for resources that have exactly one, global instance
pub const GLOBAL_KEY: &str = "global";

/// One resource's configuration, keyed by field name
pub type ResourceInstance = IndexMap<String, Value>;

/// Remove `null` entries recursively so that they read as unset
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Render a key value (string or number) as the collection key
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Compare two instances of the same key.
///
/// Returns the fields of `b` whose value differs from `a`. Nested mappings are compared
/// field by field and only their differing sub-fields are returned; lists are compared by
/// full value. Fields missing from `b` never show up in the result.
pub fn diff(a: &ResourceInstance, b: &ResourceInstance) -> ResourceInstance {
    let mut changed = ResourceInstance::new();
    for (field, value) in b {
        if let Some(delta) = diff_value(a.get(field), value) {
            changed.insert(field.clone(), delta);
        }
    }
    changed
}

fn diff_value(a: Option<&Value>, b: &Value) -> Option<Value> {
    match (a, b) {
        (Some(Value::Object(old)), Value::Object(new)) => {
            let mut nested = serde_json::Map::new();
            for (field, value) in new {
                if let Some(delta) = diff_value(old.get(field), value) {
                    nested.insert(field.clone(), delta);
                }
            }
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
        (Some(old), new) if old == new => None,
        (_, new) => Some(new.clone()),
    }
}

/// Elements of `want` that `have` does not contain, in `want` order
pub fn list_added(have: Option<&Value>, want: &[Value]) -> Vec<Value> {
    let existing = have.and_then(Value::as_array);
    want.iter()
        .filter(|item| !existing.is_some_and(|items| items.contains(item)))
        .cloned()
        .collect()
}

/// Elements of `have` that `want` does not contain, in `have` order
pub fn list_removed(have: &[Value], want: Option<&Value>) -> Vec<Value> {
    let keep = want.and_then(Value::as_array);
    have.iter()
        .filter(|item| !keep.is_some_and(|items| items.contains(item)))
        .cloned()
        .collect()
}

/// Elements present in both lists, in `have` order
pub fn list_common(have: &[Value], want: &[Value]) -> Vec<Value> {
    have.iter().filter(|item| want.contains(item)).cloned().collect()
}

/// A resource collection: instances indexed by key, in insertion order.
///
/// Serializes as the list of its instances, which is the shape facts are reported in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
    entries: IndexMap<String, ResourceInstance>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a list of instances by `key_field`.
    ///
    /// Fails with [`ModuleError::DuplicateKey`] when two entries share a key.
    pub fn index_by_key(
        resource: &str,
        items: Vec<ResourceInstance>,
        key_field: &str,
    ) -> ModuleResult<Self> {
        let mut entries = IndexMap::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let key = item.get(key_field).and_then(key_string).ok_or_else(|| {
                ModuleError::validation(
                    resource,
                    format!("entry {} is missing key field '{}'", position + 1, key_field),
                )
            })?;
            if entries.contains_key(&key) {
                return Err(ModuleError::DuplicateKey {
                    resource: resource.to_string(),
                    key,
                });
            }
            entries.insert(key, item);
        }
        Ok(Self { entries })
    }

    /// Build the collection for `spec` from a `config` parameter or facts value.
    ///
    /// Accepts a list of instances, a single instance, or nothing at all. For global
    /// resources a single mapping is stored under [`GLOBAL_KEY`]. Every instance goes
    /// through [`ResourceSpec::normalize`].
    pub fn from_value<R: ResourceSpec + ?Sized>(
        spec: &R,
        value: Option<&Value>,
    ) -> ModuleResult<Self> {
        let items = match value.cloned().map(strip_nulls) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(object @ Value::Object(_)) => vec![object],
            Some(other) => {
                return Err(ModuleError::InvalidParameter(format!(
                    "{} config must be a list or a mapping, got {}",
                    spec.name(),
                    other
                )))
            }
        };

        let mut instances = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(map) = item else {
                return Err(ModuleError::InvalidParameter(format!(
                    "{} config entries must be mappings",
                    spec.name()
                )));
            };
            let mut instance: ResourceInstance = map.into_iter().collect();
            if spec.is_global() {
                if instance.is_empty() {
                    continue;
                }
                instance.insert(spec.key_field().to_string(), Value::from(GLOBAL_KEY));
            }
            spec.normalize(&mut instance);
            instances.push(instance);
        }

        Self::index_by_key(spec.name(), instances, spec.key_field())
    }

    pub fn get(&self, key: &str) -> Option<&ResourceInstance> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceInstance)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResourceCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(value: Value) -> ResourceInstance {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let have = instance(json!({"description": "old", "speed": 10000, "duplex": "full"}));
        let want = instance(json!({"description": "new", "speed": 10000}));
        let changed = diff(&have, &want);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["description"], json!("new"));
    }

    #[test]
    fn test_diff_recurses_into_mappings_but_not_lists() {
        let have = instance(json!({"trunk": {"native_vlan": 1, "allowed_vlans": [10, 20]}}));
        let want = instance(json!({"trunk": {"native_vlan": 1, "allowed_vlans": [10, 30]}}));
        let changed = diff(&have, &want);
        assert_eq!(changed["trunk"], json!({"allowed_vlans": [10, 30]}));
    }

    #[test]
    fn test_diff_omitted_field_is_not_a_change() {
        let have = instance(json!({"description": "keep"}));
        let want = instance(json!({}));
        assert!(diff(&have, &want).is_empty());
    }

    #[test]
    fn test_list_helpers() {
        let have = [json!(1), json!(2), json!(3)];
        assert_eq!(list_added(Some(&json!([1, 2])), &have), vec![json!(3)]);
        assert_eq!(list_removed(&have, Some(&json!([2]))), vec![json!(1), json!(3)]);
        assert_eq!(list_removed(&have, None).len(), 3);
        assert_eq!(list_common(&have, &[json!(3), json!(9)]), vec![json!(3)]);
    }

    #[test]
    fn test_index_by_key_rejects_duplicates() {
        let items = vec![
            instance(json!({"vlan_id": 10})),
            instance(json!({"vlan_id": 10, "name": "again"})),
        ];
        let err = ResourceCollection::index_by_key("vlans", items, "vlan_id").unwrap_err();
        assert!(matches!(err, ModuleError::DuplicateKey { key, .. } if key == "10"));
    }

    #[test]
    fn test_index_by_key_requires_key() {
        let items = vec![instance(json!({"name": "no id"}))];
        assert!(ResourceCollection::index_by_key("vlans", items, "vlan_id").is_err());
    }

    #[test]
    fn test_strip_nulls() {
        let cleaned = strip_nulls(json!({"a": null, "b": {"c": null, "d": 1}, "e": [{"f": null}]}));
        assert_eq!(cleaned, json!({"b": {"d": 1}, "e": [{}]}));
    }

    #[test]
    fn test_collection_serializes_as_list() {
        let items = vec![
            instance(json!({"vlan_id": 1, "name": "default"})),
            instance(json!({"vlan_id": 100})),
        ];
        let collection = ResourceCollection::index_by_key("vlans", items, "vlan_id").unwrap();
        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!([{"vlan_id": 1, "name": "default"}, {"vlan_id": 100}])
        );
        assert_eq!(collection.keys().collect::<Vec<_>>(), vec!["1", "100"]);
    }
}
