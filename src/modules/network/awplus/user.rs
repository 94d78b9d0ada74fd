//! `awplus_user`: local user accounts
//!
//! Plaintext passwords cannot be read back from the switch, so `configured_password` is
//! only sent when the account is created, or on every run with `update_password: always`.
//! The built-in `manager` account at privilege 15 is never removed or demoted.

use super::{check_choice, check_known_fields, check_range, value_text};
use crate::modules::network::engine::{CommandBuffer, FieldRule, ResourceSpec, Scope};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

const RESOURCE: &str = "user";
const PROTECTED_USER: &str = "manager";

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("Invalid username regex"));

pub struct User;

impl ResourceSpec for User {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "name"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "privilege",
                |name: &str, v: &Value| vec![format!("username {} privilege {}", name, value_text(v))],
                |name: &str, _| vec![format!("username {} privilege 1", name)],
            ),
            FieldRule::new(
                "configured_password",
                |name: &str, v: &Value| vec![format!("username {} password {}", name, value_text(v))],
                super::no_lines,
            ),
            FieldRule::new(
                "hashed_password",
                |name: &str, v: &Value| vec![format!("username {} password 8 {}", name, value_text(v))],
                super::no_lines,
            ),
        ]
    }

    fn is_protected(&self, key: &str, have: &ResourceInstance) -> bool {
        key == PROTECTED_USER && have.get("privilege").and_then(Value::as_i64) == Some(15)
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(
            RESOURCE,
            key,
            want,
            &["name", "privilege", "configured_password", "hashed_password", "update_password"],
        )?;
        if !USERNAME_REGEX.is_match(key) {
            return Err(ModuleError::validation(
                RESOURCE,
                format!("'{}' is not a valid user name", key),
            ));
        }
        check_range(RESOURCE, key, want, "privilege", 1, 15)?;
        check_choice(RESOURCE, key, want, "update_password", &["always", "on_create"])?;
        if want.contains_key("configured_password") && want.contains_key("hashed_password") {
            return Err(ModuleError::validation(
                RESOURCE,
                format!(
                    "configured_password and hashed_password are mutually exclusive for {}",
                    key
                ),
            ));
        }
        Ok(())
    }

    fn render_set(
        &self,
        key: &str,
        changes: &ResourceInstance,
        want: &ResourceInstance,
        have: Option<&ResourceInstance>,
        _scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let update_always = want.get("update_password").and_then(Value::as_str) == Some("always");
        let protected = have.is_some_and(|h| self.is_protected(key, h));
        for rule in self.fields() {
            let value = match rule.name {
                "privilege" if protected && changes.contains_key(rule.name) => {
                    warn!(resource = RESOURCE, key, "not demoting protected user");
                    continue;
                }
                "configured_password" if have.is_some() && !update_always => continue,
                "configured_password" if update_always => want.get(rule.name),
                _ => changes.get(rule.name),
            };
            if let Some(value) = value {
                out.extend(None, (rule.set)(key, value));
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
        out.push(None, format!("no username {}", key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::engine::{reconcile, Mode};
    use crate::modules::network::model::ResourceCollection;
    use serde_json::json;

    fn run(want: Value, have: Value, mode: Mode) -> ModuleResult<Vec<String>> {
        let want = ResourceCollection::from_value(&User, Some(&want))?;
        let have = ResourceCollection::from_value(&User, Some(&have))?;
        reconcile(&User, &want, &have, mode)
    }

    fn have() -> Value {
        json!([
            {"name": "manager", "privilege": 15},
            {"name": "ops", "privilege": 7}
        ])
    }

    #[test]
    fn test_create_with_password() {
        let want = json!([{"name": "audit", "privilege": 3, "configured_password": "s3cret"}]);
        assert_eq!(
            run(want, have(), Mode::Merged).unwrap(),
            vec!["username audit privilege 3", "username audit password s3cret"]
        );
    }

    #[test]
    fn test_existing_user_password_only_with_update_always() {
        let want = json!([{"name": "ops", "privilege": 7, "configured_password": "x"}]);
        assert!(run(want, have(), Mode::Merged).unwrap().is_empty());

        let want = json!([{"name": "ops", "privilege": 7, "configured_password": "x", "update_password": "always"}]);
        assert_eq!(
            run(want, have(), Mode::Merged).unwrap(),
            vec!["username ops password x"]
        );
    }

    #[test]
    fn test_overridden_keeps_manager() {
        let want = json!([{"name": "ops", "privilege": 7}]);
        assert!(run(want, have(), Mode::Overridden).unwrap().is_empty());
        assert_eq!(
            run(json!([]), have(), Mode::Deleted).unwrap(),
            vec!["no username ops"]
        );
    }

    #[test]
    fn test_manager_keeps_privilege_15() {
        let want = json!([{"name": "manager", "privilege": 1, "hashed_password": "abc"}]);
        for mode in [Mode::Merged, Mode::Replaced] {
            assert_eq!(
                run(want.clone(), have(), mode).unwrap(),
                vec!["username manager password 8 abc"],
                "{}",
                mode
            );
        }
    }

    #[test]
    fn test_replaced_drops_privilege_to_default() {
        let want = json!([{"name": "ops", "hashed_password": "abc"}]);
        assert_eq!(
            run(want, have(), Mode::Replaced).unwrap(),
            vec!["username ops privilege 1", "username ops password 8 abc"]
        );
    }

    #[test]
    fn test_passwords_are_mutually_exclusive() {
        let want = json!([{"name": "ops", "configured_password": "a", "hashed_password": "b"}]);
        let err = run(want, have(), Mode::Merged).unwrap_err();
        assert!(matches!(err, ModuleError::Validation { .. }));
    }

    #[test]
    fn test_privilege_range() {
        assert!(run(json!([{"name": "ops", "privilege": 16}]), have(), Mode::Merged).is_err());
    }
}
