//! `awplus_lacp`: global LACP system priority

use super::{check_known_fields, check_range, value_text};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::ModuleResult;
use serde_json::Value;

const RESOURCE: &str = "lacp";

pub struct Lacp;

impl ResourceSpec for Lacp {
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
        vec![FieldRule::new(
            "system_priority",
            |_, v: &Value| vec![format!("lacp system-priority {}", value_text(v))],
            |_, _| vec!["no lacp system-priority".to_string()],
        )]
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["global", "system_priority"])?;
        check_range(RESOURCE, key, want, "system_priority", 1, 65535)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use crate::modules::ModuleError;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&Lacp, Some(&want))?;
        let have = ResourceCollection::from_value(&Lacp, Some(&have))?;
        reconcile(&Lacp, &want, &have, mode)
    }

    #[test]
    fn test_merged_and_idempotent() {
        let want = json!({"system_priority": 100});
        assert_eq!(
            run(want.clone(), json!({}), Mode::Merged).unwrap(),
            vec!["lacp system-priority 100"]
        );
        assert!(run(want, json!({"system_priority": 100}), Mode::Merged).unwrap().is_empty());
    }

    #[test]
    fn test_deleted_resets_priority() {
        assert_eq!(
            run(json!({}), json!({"system_priority": 100}), Mode::Deleted).unwrap(),
            vec!["no lacp system-priority"]
        );
        assert!(run(json!({}), json!({}), Mode::Deleted).unwrap().is_empty());
    }

    #[test]
    fn test_priority_out_of_range() {
        let err = run(json!({"system_priority": 70000}), json!({}), Mode::Merged).unwrap_err();
        assert!(matches!(err, ModuleError::Validation { .. }));
        assert!(run(json!({"system_priority": 0}), json!({}), Mode::Merged).is_err());
    }
}
