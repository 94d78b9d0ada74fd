//! `awplus_banner`: login (`motd`) and exec banners

use super::{check_choice, check_known_fields, value_text};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::{ModuleError, ModuleResult};
use serde_json::Value;

const RESOURCE: &str = "banner";

pub struct Banner;

impl ResourceSpec for Banner {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn key_field(&self) -> &'static str {
        "banner"
    }

    fn fields(&self) -> Vec<FieldRule> {
        vec![FieldRule::new(
            "text",
            |banner: &str, v: &Value| vec![format!("banner {} {}", banner, value_text(v))],
            // the exec banner has a default text instead of a negated form
            |banner: &str, _| match banner {
                "exec" => vec!["banner exec default".to_string()],
                other => vec![format!("no banner {}", other)],
            },
        )]
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        check_known_fields(RESOURCE, key, want, &["banner", "text"])?;
        check_choice(RESOURCE, key, want, "banner", &["motd", "exec"])?;
        if let Some(text) = want.get("text") {
            let valid = text
                .as_str()
                .is_some_and(|t| !t.trim().is_empty() && !t.contains('\n'));
            if !valid {
                return Err(ModuleError::validation(
                    RESOURCE,
                    format!("text of the {} banner must be a single non-empty line", key),
                ));
            }
        }
        Ok(())
    }
}
