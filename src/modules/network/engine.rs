//! Want/have reconciliation engine
//!
//! One generic function turns a desired collection (`want`), the collection read from the
//! device (`have`) and a [`Mode`] into the ordered list of CLI commands that moves the
//! device from one to the other. Everything resource specific lives behind
//! [`ResourceSpec`]: the field table, the context line, protected keys, validation and
//! the per-resource ordering rule.
//!
//! The engine performs no I/O. It either returns the complete command list or an error,
//! never a partial list.

use super::model::{
    diff, list_added, list_common, list_removed, ResourceCollection, ResourceInstance,
};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// Mode
// ============================================================================

/// Reconciliation semantics for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Add and update what `want` names; never remove anything
    #[default]
    Merged,
    /// Make every key in `want` match exactly; leave other keys alone
    Replaced,
    /// Make the whole resource match `want`; remove keys `want` does not name
    Overridden,
    /// Remove what `want` names, or everything when `want` is empty
    Deleted,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Merged => "merged",
            Mode::Replaced => "replaced",
            Mode::Overridden => "overridden",
            Mode::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merged" => Ok(Mode::Merged),
            "replaced" => Ok(Mode::Replaced),
            "overridden" => Ok(Mode::Overridden),
            "deleted" => Ok(Mode::Deleted),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid state '{}'. Valid options: merged, replaced, overridden, deleted",
                s
            ))),
        }
    }
}

// ============================================================================
// Ordering rules
// ============================================================================

/// Where removals of `have`-only keys go relative to updates in `overridden`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideOrder {
    /// Update every `want` key, then remove `have`-only keys
    #[default]
    UpdateThenRemove,
    /// Remove `have`-only keys first, then update `want` keys
    RemoveThenUpdate,
    /// Walk `have` in order, updating or removing each key, then create new keys
    Interleaved,
}

/// Per-resource ordering configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingRules {
    pub override_order: OverrideOrder,
    /// Whether `overridden` creates `want` keys that are missing from `have`
    pub override_creates: bool,
}

impl Default for OrderingRules {
    fn default() -> Self {
        Self {
            override_order: OverrideOrder::UpdateThenRemove,
            override_creates: true,
        }
    }
}

// ============================================================================
// Command buffer
// ============================================================================

/// Ordered command list that coalesces repeated context lines.
///
/// A context line (`interface port1.0.1`, `vlan database`) is emitted only when the
/// context changes between consecutive lines. A global line resets the context.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<String>,
    current: Option<String>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line, entering `context` first if needed
    pub fn push(&mut self, context: Option<&str>, line: impl Into<String>) {
        match context {
            Some(ctx) => {
                if self.current.as_deref() != Some(ctx) {
                    self.commands.push(ctx.to_string());
                    self.current = Some(ctx.to_string());
                }
            }
            None => self.current = None,
        }
        self.commands.push(line.into());
    }

    /// Append several lines under the same context
    pub fn extend<I>(&mut self, context: Option<&str>, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines {
            self.push(context, line);
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }
}

// ============================================================================
// Resource specification
// ============================================================================

/// Renders one field. Receives the key and the value to set or clear.
///
/// For list fields the value is the list of elements to add or remove; for mapping fields
/// it is the mapping of sub-fields to set or clear.
pub type RenderFn = fn(&str, &Value) -> Vec<String>;

/// One row of a resource's field table
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub set: RenderFn,
    pub clear: RenderFn,
    /// Clear the old value before setting a new one, instead of overwriting it
    pub negate_first: bool,
    /// For lists of mappings: sub-field that identifies an element when deleting
    pub identity: Option<&'static str>,
}

impl FieldRule {
    pub fn new(name: &'static str, set: RenderFn, clear: RenderFn) -> Self {
        Self {
            name,
            set,
            clear,
            negate_first: false,
            identity: None,
        }
    }

    pub fn negate_first(mut self) -> Self {
        self.negate_first = true;
        self
    }

    pub fn identified_by(mut self, field: &'static str) -> Self {
        self.identity = Some(field);
        self
    }
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("negate_first", &self.negate_first)
            .field("identity", &self.identity)
            .finish()
    }
}

/// The whole of one reconciliation, for resources whose keys are not independent
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub mode: Mode,
    pub want: &'a ResourceCollection,
    pub have: &'a ResourceCollection,
}

/// Everything the engine needs to know about one resource type
pub trait ResourceSpec: Send + Sync {
    /// Short resource name (`vlans`, `interfaces`, ...)
    fn name(&self) -> &'static str;

    /// Field holding the instance key
    fn key_field(&self) -> &'static str;

    /// Field table, in the order commands are rendered
    fn fields(&self) -> Vec<FieldRule>;

    /// Whether the resource has a single global instance
    fn is_global(&self) -> bool {
        false
    }

    /// Context line that scopes this key's commands
    fn context(&self, key: &str) -> Option<String> {
        let _ = key;
        None
    }

    /// Fill in device defaults so that want and have compare equal when they mean the same
    fn normalize(&self, instance: &mut ResourceInstance) {
        let _ = instance;
    }

    fn ordering(&self) -> OrderingRules {
        OrderingRules::default()
    }

    /// Keys that must never be cleared or removed
    fn is_protected(&self, key: &str, have: &ResourceInstance) -> bool {
        let _ = (key, have);
        false
    }

    /// Whether `mode` needs a non-empty `want`
    fn requires_config(&self, mode: Mode) -> bool {
        mode != Mode::Deleted
    }

    /// Validate one desired instance
    fn validate(&self, key: &str, want: &ResourceInstance) -> ModuleResult<()> {
        let _ = (key, want);
        Ok(())
    }

    /// Validate constraints that span several instances
    fn validate_collection(&self, want: &ResourceCollection) -> ModuleResult<()> {
        let _ = want;
        Ok(())
    }

    /// Render the fields in `changes` as set commands.
    ///
    /// Called for every changed key, and for keys missing from `have` even when
    /// `changes` is empty.
    fn render_set(
        &self,
        key: &str,
        changes: &ResourceInstance,
        want: &ResourceInstance,
        have: Option<&ResourceInstance>,
        scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let _ = (want, have, scope);
        let context = self.context(key);
        for rule in self.fields() {
            if let Some(value) = changes.get(rule.name) {
                out.extend(context.as_deref(), (rule.set)(key, value));
            }
        }
    }

    /// Render the fields in `clears` as clear commands.
    ///
    /// `want` is the instance that will be merged right after, or `None` when the fields
    /// are being deleted outright.
    fn render_clear(
        &self,
        key: &str,
        clears: &ResourceInstance,
        have: &ResourceInstance,
        want: Option<&ResourceInstance>,
        scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let _ = (have, want, scope);
        let context = self.context(key);
        for rule in self.fields() {
            if let Some(value) = clears.get(rule.name) {
                out.extend(context.as_deref(), (rule.clear)(key, value));
            }
        }
    }

    /// Render removal of a whole key. Defaults to clearing every field it has.
    fn render_remove(
        &self,
        key: &str,
        have: &ResourceInstance,
        scope: &Scope<'_>,
        out: &mut CommandBuffer,
    ) {
        let mut fields = have.clone();
        fields.shift_remove(self.key_field());
        self.render_clear(key, &fields, have, None, scope, out);
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Check a desired collection before anything is computed from it
pub fn validate_want<R: ResourceSpec + ?Sized>(
    spec: &R,
    want: &ResourceCollection,
    mode: Mode,
) -> ModuleResult<()> {
    if want.is_empty() && spec.requires_config(mode) {
        return Err(ModuleError::MissingParameter(format!(
            "config must not be empty for state {} of {}",
            mode,
            spec.name()
        )));
    }

    for (key, instance) in want.iter() {
        spec.validate(key, instance)?;
    }
    spec.validate_collection(want)
}

/// Compute the commands that move `have` to `want` under `mode`
pub fn reconcile<R: ResourceSpec + ?Sized>(
    spec: &R,
    want: &ResourceCollection,
    have: &ResourceCollection,
    mode: Mode,
) -> ModuleResult<Vec<String>> {
    validate_want(spec, want, mode)?;

    let scope = Scope { mode, want, have };
    let mut out = CommandBuffer::new();
    match mode {
        Mode::Merged => {
            for (key, w) in want.iter() {
                merge_key(spec, key, w, have.get(key), &scope, &mut out);
            }
        }
        Mode::Replaced => {
            for (key, w) in want.iter() {
                replace_key(spec, key, w, have.get(key), &scope, &mut out);
            }
        }
        Mode::Overridden => override_all(spec, &scope, &mut out),
        Mode::Deleted => {
            if want.is_empty() {
                for (key, h) in have.iter() {
                    remove_key(spec, key, h, &scope, &mut out);
                }
            } else {
                for (key, w) in want.iter() {
                    match have.get(key) {
                        Some(h) => delete_named(spec, key, w, h, &scope, &mut out),
                        None => debug!(resource = spec.name(), key, "nothing to delete"),
                    }
                }
            }
        }
    }

    debug!(
        resource = spec.name(),
        state = %mode,
        commands = out.len(),
        "reconciled"
    );
    Ok(out.into_commands())
}

fn override_all<R: ResourceSpec + ?Sized>(spec: &R, scope: &Scope<'_>, out: &mut CommandBuffer) {
    let (want, have) = (scope.want, scope.have);
    let rules = spec.ordering();
    let update = |key: &str, w: &ResourceInstance, out: &mut CommandBuffer| {
        let h = have.get(key);
        if h.is_some() || rules.override_creates {
            replace_key(spec, key, w, h, scope, out);
        }
    };
    let remove_stale = |out: &mut CommandBuffer| {
        for (key, h) in have.iter().filter(|(k, _)| !want.contains_key(k)) {
            remove_key(spec, key, h, scope, out);
        }
    };

    match rules.override_order {
        OverrideOrder::UpdateThenRemove => {
            for (key, w) in want.iter() {
                update(key, w, out);
            }
            remove_stale(out);
        }
        OverrideOrder::RemoveThenUpdate => {
            remove_stale(out);
            for (key, w) in want.iter() {
                update(key, w, out);
            }
        }
        OverrideOrder::Interleaved => {
            for (key, h) in have.iter() {
                match want.get(key) {
                    Some(w) => replace_key(spec, key, w, Some(h), scope, out),
                    None => remove_key(spec, key, h, scope, out),
                }
            }
            for (key, w) in want.iter().filter(|(k, _)| !have.contains_key(k)) {
                update(key, w, out);
            }
        }
    }
}

/// merged: set what differs, never clear
fn merge_key<R: ResourceSpec + ?Sized>(
    spec: &R,
    key: &str,
    want: &ResourceInstance,
    have: Option<&ResourceInstance>,
    scope: &Scope<'_>,
    out: &mut CommandBuffer,
) {
    let changes = set_changes(spec, want, have);
    if changes.is_empty() && have.is_some() {
        return;
    }
    debug!(resource = spec.name(), key, fields = changes.len(), "setting fields");
    spec.render_set(key, &changes, want, have, scope, out);
}

/// replaced: clear what `want` drops, then merge
fn replace_key<R: ResourceSpec + ?Sized>(
    spec: &R,
    key: &str,
    want: &ResourceInstance,
    have: Option<&ResourceInstance>,
    scope: &Scope<'_>,
    out: &mut CommandBuffer,
) {
    if let Some(h) = have {
        let clears = clear_changes(spec, h, want);
        if !clears.is_empty() {
            if spec.is_protected(key, h) {
                warn!(resource = spec.name(), key, "not clearing fields of protected key");
            } else {
                debug!(resource = spec.name(), key, fields = clears.len(), "clearing fields");
                spec.render_clear(key, &clears, h, Some(want), scope, out);
            }
        }
    }
    merge_key(spec, key, want, have, scope, out);
}

fn remove_key<R: ResourceSpec + ?Sized>(
    spec: &R,
    key: &str,
    have: &ResourceInstance,
    scope: &Scope<'_>,
    out: &mut CommandBuffer,
) {
    if spec.is_protected(key, have) {
        warn!(resource = spec.name(), key, "skipping removal of protected key");
        return;
    }
    debug!(resource = spec.name(), key, "removing");
    spec.render_remove(key, have, scope, out);
}

/// deleted with a named key: remove it whole, or only the fields the caller listed
fn delete_named<R: ResourceSpec + ?Sized>(
    spec: &R,
    key: &str,
    want: &ResourceInstance,
    have: &ResourceInstance,
    scope: &Scope<'_>,
    out: &mut CommandBuffer,
) {
    let named: Vec<&String> = want.keys().filter(|f| *f != spec.key_field()).collect();
    if named.is_empty() {
        remove_key(spec, key, have, scope, out);
        return;
    }
    if spec.is_protected(key, have) {
        warn!(resource = spec.name(), key, "not clearing fields of protected key");
        return;
    }

    let rules = spec.fields();
    let mut clears = ResourceInstance::new();
    for field in named {
        let (Some(h), Some(w)) = (have.get(field), want.get(field)) else {
            continue;
        };
        let identity = rules
            .iter()
            .find(|rule| rule.name == field)
            .and_then(|rule| rule.identity);
        if let Some(value) = named_clear(h, w, identity) {
            clears.insert(field.clone(), value);
        }
    }
    if !clears.is_empty() {
        spec.render_clear(key, &clears, have, None, scope, out);
    }
}

// ============================================================================
// Field-level change computation
// ============================================================================

/// Fields to set so that `have` carries everything `want` states.
///
/// Starts from the structural [`diff`] and narrows list fields to the elements that are
/// actually missing.
fn set_changes<R: ResourceSpec + ?Sized>(
    spec: &R,
    want: &ResourceInstance,
    have: Option<&ResourceInstance>,
) -> ResourceInstance {
    let empty = ResourceInstance::new();
    let have = have.unwrap_or(&empty);
    let mut changes = ResourceInstance::new();
    for (field, value) in diff(have, want) {
        if field == spec.key_field() {
            continue;
        }
        if let Some(value) = narrow_set(have.get(&field), &value, want.get(&field)) {
            changes.insert(field, value);
        }
    }
    changes
}

fn narrow_set(have: Option<&Value>, delta: &Value, want: Option<&Value>) -> Option<Value> {
    match (delta, want) {
        (Value::Array(_), Some(Value::Array(items))) => {
            let added = list_added(have, items);
            (!added.is_empty()).then_some(Value::Array(added))
        }
        (Value::Object(sub), Some(Value::Object(want_sub))) => {
            let have_sub = have.and_then(Value::as_object);
            let mut nested = serde_json::Map::new();
            for (field, value) in sub {
                let old = have_sub.and_then(|m| m.get(field));
                if let Some(v) = narrow_set(old, value, want_sub.get(field)) {
                    nested.insert(field.clone(), v);
                }
            }
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
        _ => Some(delta.clone()),
    }
}

/// Fields of `have` that must be cleared for `replaced`: everything `want` leaves out,
/// list elements `want` drops, and changed values of negate-first fields.
fn clear_changes<R: ResourceSpec + ?Sized>(
    spec: &R,
    have: &ResourceInstance,
    want: &ResourceInstance,
) -> ResourceInstance {
    let rules = spec.fields();
    let mut clears = ResourceInstance::new();
    for (field, value) in have {
        if field == spec.key_field() {
            continue;
        }
        let negate_first = rules
            .iter()
            .any(|rule| rule.name == field && rule.negate_first);
        if let Some(v) = narrow_clear(value, want.get(field), negate_first) {
            clears.insert(field.clone(), v);
        }
    }
    clears
}

fn narrow_clear(have: &Value, want: Option<&Value>, negate_first: bool) -> Option<Value> {
    let Some(want) = want else {
        return Some(have.clone());
    };
    match (have, want) {
        (Value::Array(items), Value::Array(_)) => {
            let removed = list_removed(items, Some(want));
            (!removed.is_empty()).then_some(Value::Array(removed))
        }
        (Value::Object(have_sub), Value::Object(want_sub)) => {
            let mut nested = serde_json::Map::new();
            for (field, value) in have_sub {
                if let Some(v) = narrow_clear(value, want_sub.get(field), false) {
                    nested.insert(field.clone(), v);
                }
            }
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
        _ if negate_first && have != want => Some(have.clone()),
        _ => None,
    }
}

/// Part of `have` named by a `deleted` request: for lists the shared elements (all of
/// them when the request lists none), for mappings the named sub-fields, otherwise the
/// current value.
fn named_clear(have: &Value, want: &Value, identity: Option<&str>) -> Option<Value> {
    match (have, want) {
        (Value::Array(items), Value::Array(named)) if !named.is_empty() => {
            let common = match identity {
                Some(id) => items
                    .iter()
                    .filter(|item| named.iter().any(|n| n.get(id) == item.get(id)))
                    .cloned()
                    .collect(),
                None => list_common(items, named),
            };
            (!common.is_empty()).then_some(Value::Array(common))
        }
        (Value::Object(have_sub), Value::Object(want_sub)) if !want_sub.is_empty() => {
            let mut nested = serde_json::Map::new();
            for (field, named) in want_sub {
                if let Some(v) = have_sub.get(field).and_then(|h| named_clear(h, named, None)) {
                    nested.insert(field.clone(), v);
                }
            }
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
        _ => Some(have.clone()),
    }
}
