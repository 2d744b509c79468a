// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Env plugin: injects payload-declared environment variables into the
//! sandbox.

use crate::{Plugin, PluginError, PluginOptions, TaskPlugin, TaskPluginOptions};
use async_trait::async_trait;
use std::collections::BTreeMap;
use stint_core::{FieldKind, PayloadSchema};
use stint_engine::SandboxBuilder;

pub(crate) fn factory(_options: &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> {
    Ok(Box::new(EnvPlugin))
}

/// Reads an optional `env` object from the payload and applies each entry
/// to the sandbox builder.
pub struct EnvPlugin;

#[async_trait]
impl Plugin for EnvPlugin {
    fn payload_schema(&self) -> Result<PayloadSchema, PluginError> {
        Ok(PayloadSchema::part("env")
            .optional("env", FieldKind::Object)
            .build())
    }

    async fn new_task_plugin(
        &self,
        options: TaskPluginOptions,
    ) -> Result<Box<dyn TaskPlugin>, PluginError> {
        // BTreeMap keeps injection order deterministic.
        let vars = match options.payload.get("env") {
            Some(value) => serde_json::from_value::<BTreeMap<String, String>>(value.clone())
                .map_err(|error| {
                    PluginError::MalformedPayload(format!("env values must be strings: {error}"))
                })?,
            None => BTreeMap::new(),
        };
        Ok(Box::new(EnvTaskPlugin { vars }))
    }
}

struct EnvTaskPlugin {
    vars: BTreeMap<String, String>,
}

#[async_trait]
impl TaskPlugin for EnvTaskPlugin {
    async fn build_sandbox(&mut self, builder: &mut dyn SandboxBuilder) -> Result<(), PluginError> {
        for (name, value) in &self.vars {
            builder
                .set_env_var(name, value)
                .map_err(|error| PluginError::Hook(error.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
