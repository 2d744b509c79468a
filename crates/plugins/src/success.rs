// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Success plugin: resolves a task from its sandbox result.

use crate::{Plugin, PluginError, PluginOptions, TaskPlugin, TaskPluginOptions};
use async_trait::async_trait;
use stint_core::{PayloadSchema, TaskInfo};
use stint_engine::ResultSet;

pub(crate) fn factory(_options: &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> {
    Ok(Box::new(SuccessPlugin))
}

/// Turns the sandbox's exit verdict into the task resolution.
pub struct SuccessPlugin;

#[async_trait]
impl Plugin for SuccessPlugin {
    fn payload_schema(&self) -> Result<PayloadSchema, PluginError> {
        Ok(PayloadSchema::empty())
    }

    async fn new_task_plugin(
        &self,
        options: TaskPluginOptions,
    ) -> Result<Box<dyn TaskPlugin>, PluginError> {
        Ok(Box::new(SuccessTaskPlugin {
            info: options.task_info,
        }))
    }
}

struct SuccessTaskPlugin {
    info: TaskInfo,
}

#[async_trait]
impl TaskPlugin for SuccessTaskPlugin {
    async fn stopped(&mut self, result: &dyn ResultSet) -> Result<bool, PluginError> {
        Ok(result.success())
    }

    async fn finished(&mut self, success: bool) -> Result<(), PluginError> {
        tracing::info!(
            task_id = %self.info.task_id,
            run_id = self.info.run_id,
            success,
            "task resolved"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "success_tests.rs"]
mod tests;
