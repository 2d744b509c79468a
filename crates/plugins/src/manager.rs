// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered plugin pipeline composition.

use crate::{Plugin, PluginError, PluginOptions, TaskPlugin, TaskPluginOptions};
use async_trait::async_trait;
use stint_core::PayloadSchema;
use stint_engine::{ResultSet, Sandbox, SandboxBuilder};
use stint_runtime::TaskContext;

type PluginFactory = fn(&PluginOptions) -> Result<Box<dyn Plugin>, PluginError>;

/// Explicit constructor table. Pipeline order follows the enabled list from
/// the configuration, not this table.
const FACTORIES: &[(&str, PluginFactory)] = &[
    ("success", crate::success::factory),
    ("env", crate::env::factory),
];

/// Names of all plugins the worker can activate.
pub fn plugin_names() -> Vec<&'static str> {
    FACTORIES.iter().map(|(name, _)| *name).collect()
}

struct NamedPlugin {
    name: String,
    plugin: Box<dyn Plugin>,
}

/// Ordered composition of enabled plugins.
///
/// Implements [`Plugin`] itself: its payload schema is the composition of
/// the members' schemas, and its task plugin fans every hook over the
/// members in pipeline order.
pub struct PluginManager {
    plugins: Vec<NamedPlugin>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugins.iter().map(|p| &p.name).collect::<Vec<_>>())
            .finish()
    }
}

impl PluginManager {
    /// Build the pipeline from the enabled plugin names.
    ///
    /// An unknown name is fatal: the worker refuses to start rather than
    /// silently skip a plugin.
    pub fn new(enabled: &[String], options: &PluginOptions) -> Result<Self, PluginError> {
        let mut plugins = Vec::with_capacity(enabled.len());
        for name in enabled {
            let factory = FACTORIES
                .iter()
                .find(|(candidate, _)| candidate == name)
                .map(|(_, factory)| *factory)
                .ok_or_else(|| PluginError::UnknownPlugin(name.clone()))?;
            plugins.push(NamedPlugin {
                name: name.clone(),
                plugin: factory(options)?,
            });
        }
        Ok(Self { plugins })
    }

    /// Build a pipeline directly from plugin instances, bypassing the
    /// factory table. For tests that compose fakes.
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_plugins(plugins: Vec<(String, Box<dyn Plugin>)>) -> Self {
        Self {
            plugins: plugins
                .into_iter()
                .map(|(name, plugin)| NamedPlugin { name, plugin })
                .collect(),
        }
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }
}

#[async_trait]
impl Plugin for PluginManager {
    fn payload_schema(&self) -> Result<PayloadSchema, PluginError> {
        let mut schemas = Vec::with_capacity(self.plugins.len());
        for member in &self.plugins {
            schemas.push(member.plugin.payload_schema()?);
        }
        Ok(PayloadSchema::compose(schemas)?)
    }

    async fn new_task_plugin(
        &self,
        options: TaskPluginOptions,
    ) -> Result<Box<dyn TaskPlugin>, PluginError> {
        let mut members = Vec::with_capacity(self.plugins.len());
        for member in &self.plugins {
            members.push(NamedTaskPlugin {
                name: member.name.clone(),
                plugin: member.plugin.new_task_plugin(options.clone()).await?,
            });
        }
        Ok(Box::new(TaskPluginSet { members }))
    }
}

struct NamedTaskPlugin {
    name: String,
    plugin: Box<dyn TaskPlugin>,
}

/// Per-task pipeline: every hook fans over the members in order.
struct TaskPluginSet {
    members: Vec<NamedTaskPlugin>,
}

impl TaskPluginSet {
    fn trace_failure(name: &str, hook: &str, error: &PluginError) {
        tracing::warn!(plugin = name, hook, %error, "plugin hook failed");
    }
}

#[async_trait]
impl TaskPlugin for TaskPluginSet {
    async fn prepare(&mut self, context: &TaskContext) -> Result<(), PluginError> {
        for member in &mut self.members {
            if let Err(error) = member.plugin.prepare(context).await {
                Self::trace_failure(&member.name, "prepare", &error);
                return Err(error);
            }
        }
        Ok(())
    }

    async fn build_sandbox(&mut self, builder: &mut dyn SandboxBuilder) -> Result<(), PluginError> {
        for member in &mut self.members {
            if let Err(error) = member.plugin.build_sandbox(builder).await {
                Self::trace_failure(&member.name, "build_sandbox", &error);
                return Err(error);
            }
        }
        Ok(())
    }

    async fn started(&mut self, sandbox: &dyn Sandbox) -> Result<(), PluginError> {
        for member in &mut self.members {
            if let Err(error) = member.plugin.started(sandbox).await {
                Self::trace_failure(&member.name, "started", &error);
                return Err(error);
            }
        }
        Ok(())
    }

    async fn stopped(&mut self, result: &dyn ResultSet) -> Result<bool, PluginError> {
        let mut success = true;
        for member in &mut self.members {
            match member.plugin.stopped(result).await {
                Ok(verdict) => success &= verdict,
                Err(error) => {
                    Self::trace_failure(&member.name, "stopped", &error);
                    return Err(error);
                }
            }
        }
        Ok(success)
    }

    async fn finished(&mut self, success: bool) -> Result<(), PluginError> {
        for member in &mut self.members {
            if let Err(error) = member.plugin.finished(success).await {
                Self::trace_failure(&member.name, "finished", &error);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Unlike the other hooks, dispose always runs for every member; the
    /// first error is reported after all members had their chance.
    async fn dispose(&mut self) -> Result<(), PluginError> {
        let mut first_error = None;
        for member in &mut self.members {
            if let Err(error) = member.plugin.dispose().await {
                Self::trace_failure(&member.name, "dispose", &error);
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
