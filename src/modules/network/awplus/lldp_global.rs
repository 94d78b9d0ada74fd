//! `awplus_lldp_global`: LLDP agent and timers

use super::{check_bool, check_known_fields, check_range, value_text};
use crate::modules::network::engine::{FieldRule, ResourceSpec};
use crate::modules::network::model::ResourceInstance;
use crate::modules::ModuleResult;
use serde_json::Value;

const RESOURCE: &str = "lldp_global";

/// (field, CLI keyword, min, max)
const TIMERS: &[(&str, &str, i64, i64)] = &[
    ("holdtime_multiplier", "holdtime-multiplier", 2, 10),
    ("timer", "timer", 5, 32768),
    ("notification_interval", "notification-interval", 5, 3600),
    ("tx_delay", "tx-delay", 1, 8192),
    ("reinit", "reinit", 1, 10),
];

macro_rules! timer_rule {
    ($field:literal, $keyword:literal) => {
        FieldRule::new(
            $field,
            |_, v: &Value| vec![format!(concat!("lldp ", $keyword, " {}"), value_text(v))],
            |_, _| vec![concat!("no lldp ", $keyword).to_string()],
        )
    };
}

pub struct LldpGlobal;

impl ResourceSpec for LldpGlobal {
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
        vec![
            FieldRule::new(
                "enabled",
                |_, v: &Value| match v.as_bool() {
                    Some(true) => vec!["lldp run".to_string()],
                    _ => vec!["no lldp run".to_string()],
                },
                |_, v: &Value| match v.as_bool() {
                    Some(true) => vec!["no lldp run".to_string()],
                    _ => Vec::new(),
                },
            ),
            timer_rule!("holdtime_multiplier", "holdtime-multiplier"),
            timer_rule!("timer", "timer"),
            timer_rule!("notification_interval", "notification-interval"),
            timer_rule!("tx_delay", "tx-delay"),
            timer_rule!("reinit", "reinit"),
        ]
    }

    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        let mut known = vec!["global", "enabled"];
        known.extend(TIMERS.iter().map(|(field, ..)| *field));
        check_known_fields(RESOURCE, key, want, &known)?;
        check_bool(RESOURCE, key, want, "enabled")?;
        for (field, _, min, max) in TIMERS {
            check_range(RESOURCE, key, want, field, *min, *max)?;
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
        let want = ResourceCollection::from_value(&LldpGlobal, Some(&want))?;
        let have = ResourceCollection::from_value(&LldpGlobal, Some(&have))?;
        reconcile(&LldpGlobal, &want, &have, mode)
    }

    #[test]
    fn test_field_table_matches_timer_list() {
        let names: Vec<&str> = LldpGlobal.fields().iter().skip(1).map(|r| r.name).collect();
        let timers: Vec<&str> = TIMERS.iter().map(|(f, ..)| *f).collect();
        assert_eq!(names, timers);
    }

    #[test]
    fn test_merged_timers() {
        let want = json!({"enabled": true, "timer": 60, "tx_delay": 5});
        let have = json!({"enabled": true, "timer": 30});
        assert_eq!(
            run(want, have, Mode::Merged).unwrap(),
            vec!["lldp timer 60", "lldp tx-delay 5"]
        );
    }

    #[test]
    fn test_replaced_resets_unlisted_timers() {
        let want = json!({"enabled": true});
        let have = json!({"enabled": true, "reinit": 4, "holdtime_multiplier": 6});
        assert_eq!(
            run(want, have, Mode::Replaced).unwrap(),
            vec!["no lldp holdtime-multiplier", "no lldp reinit"]
        );
    }

    #[test]
    fn test_deleted_disables_agent() {
        let have = json!({"enabled": true, "timer": 60});
        assert_eq!(
            run(json!({}), have, Mode::Deleted).unwrap(),
            vec!["no lldp run", "no lldp timer"]
        );
    }

    #[test]
    fn test_ranges() {
        assert!(run(json!({"holdtime_multiplier": 1}), json!({}), Mode::Merged).is_err());
        assert!(run(json!({"timer": 40000}), json!({}), Mode::Merged).is_err());
        assert!(run(json!({"reinit": 10}), json!({}), Mode::Merged).is_ok());
    }
}
