//! Resource module facade
//!
//! Wraps a [`ResourceSpec`] as a [`Module`]: read the current facts from the device,
//! reconcile them against the `config` parameter, push the commands and read the facts
//! again.

use super::common::{generate_config_diff, generate_facts_diff, SaveWhen};
use super::engine::{reconcile, validate_want, Mode, ResourceSpec};
use super::model::{ResourceCollection, GLOBAL_KEY};
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

const ACCEPTED_PARAMS: &[&str] = &["config", "state"];

/// Parameters every resource module accepts
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceParams {
    /// Desired collection, absent when only `state: deleted` is given
    pub config: Option<Value>,
    pub state: Mode,
}

impl ResourceParams {
    /// Parse parameters from module params
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        if let Some(unknown) = params.keys().find(|k| !ACCEPTED_PARAMS.contains(&k.as_str())) {
            return Err(ModuleError::InvalidParameter(format!(
                "Unsupported parameter '{}'. Supported: {}",
                unknown,
                ACCEPTED_PARAMS.join(", ")
            )));
        }

        let state = match params.get_string("state")? {
            Some(s) => s.parse()?,
            None => Mode::default(),
        };
        let config = params.get("config").filter(|v| !v.is_null()).cloned();

        Ok(Self { config, state })
    }
}

/// What one invocation did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceResult {
    pub changed: bool,
    pub commands: Vec<String>,
    pub before: Value,
    /// Facts read back after applying; absent in check mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

/// A [`Module`] backed by the generic reconciliation engine
pub struct ResourceModule<R> {
    name: &'static str,
    description: &'static str,
    spec: R,
}

impl<R: ResourceSpec> ResourceModule<R> {
    pub fn new(name: &'static str, description: &'static str, spec: R) -> Self {
        Self {
            name,
            description,
            spec,
        }
    }

    pub fn spec(&self) -> &R {
        &self.spec
    }

    fn desired(&self, params: &ResourceParams) -> ModuleResult<ResourceCollection> {
        ResourceCollection::from_value(&self.spec, params.config.as_ref())
    }

    /// Run one reconciliation and collect the result
    pub fn run(&self, params: &ResourceParams, context: &ModuleContext) -> ModuleResult<ResourceResult> {
        let want = self.desired(params)?;
        validate_want(&self.spec, &want, params.state)?;

        let device = context.device.as_ref().ok_or_else(|| {
            ModuleError::ReadFailed(format!("{} requires a device to read from", self.name))
        })?;

        let have = ResourceCollection::from_value(
            &self.spec,
            Some(&device.get_facts(self.spec.name())?),
        )?;
        let commands = reconcile(&self.spec, &want, &have, params.state)?;
        let before = self.facts_value(&have)?;

        if context.check_mode {
            debug!(module = self.name, commands = commands.len(), "check mode, not applying");
            return Ok(ResourceResult {
                changed: !commands.is_empty(),
                commands,
                before,
                after: None,
            });
        }

        if !commands.is_empty() {
            device.apply_config(&commands)?;
        } else if device.save_when() == SaveWhen::Always {
            device.save_config()?;
        }

        let after = ResourceCollection::from_value(
            &self.spec,
            Some(&device.get_facts(self.spec.name())?),
        )?;
        info!(
            module = self.name,
            host = device.hostname(),
            state = %params.state,
            commands = commands.len(),
            "resource reconciled"
        );

        Ok(ResourceResult {
            changed: !commands.is_empty(),
            commands,
            before,
            after: Some(self.facts_value(&after)?),
        })
    }

    /// Facts in the shape the resource is declared in: a list of instances, or a single
    /// mapping without the synthetic key for global resources
    fn facts_value(&self, collection: &ResourceCollection) -> ModuleResult<Value> {
        if !self.spec.is_global() {
            return to_value(collection);
        }
        let mut instance = collection.get(GLOBAL_KEY).cloned().unwrap_or_default();
        instance.shift_remove(self.spec.key_field());
        to_value(&instance)
    }

    fn diff_for(&self, result: &ResourceResult) -> ModuleResult<Diff> {
        match &result.after {
            Some(after) => generate_facts_diff(&result.before, after),
            None => {
                let planned = result.commands.join("\n");
                let diff = generate_config_diff("", &planned);
                Ok(Diff::new(
                    "(current configuration)",
                    format!("{} commands", result.commands.len()),
                )
                .with_details(diff.details.unwrap_or_default()))
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> ModuleResult<Value> {
    serde_json::to_value(value).map_err(|e| ModuleError::ParseError(e.to_string()))
}

impl<R: ResourceSpec> Module for ResourceModule<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let params = ResourceParams::from_params(params)?;
        let want = self.desired(&params)?;
        validate_want(&self.spec, &want, params.state)
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let resource_params = ResourceParams::from_params(params)?;
        let result = self.run(&resource_params, context)?;

        let mut output = if result.changed {
            let verb = if context.check_mode { "would be" } else { "were" };
            ModuleOutput::changed(format!(
                "{} commands {} sent for {}",
                result.commands.len(),
                verb,
                self.spec.name()
            ))
        } else {
            ModuleOutput::ok(format!("{} already in desired state", self.spec.name()))
        };

        if context.diff_mode && result.changed {
            output = output.with_diff(self.diff_for(&result)?);
        }

        output = output
            .with_data("commands", Value::from(result.commands.clone()))
            .with_data("before", result.before.clone())
            .with_data("state", Value::from(resource_params.state.as_str()));
        if let Some(after) = result.after {
            output = output.with_data("after", after);
        }
        Ok(output)
    }
}
