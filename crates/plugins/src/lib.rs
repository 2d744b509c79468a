// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stint-plugins: the lifecycle plugin pipeline
//!
//! Plugins observe and mutate the sandbox lifecycle around a task run. A
//! [`Plugin`] is the long-lived, shared side (one instance per worker); a
//! [`TaskPlugin`] is the per-task side created for every run. The
//! [`PluginManager`] composes enabled plugins into one pipeline that itself
//! implements [`Plugin`].

mod env;
mod manager;
mod success;

pub use manager::{plugin_names, PluginManager};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePlugin;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use stint_core::{PayloadError, PayloadSchema, TaskInfo};
use stint_engine::{Engine, ResultSet, Sandbox, SandboxBuilder};
use stint_runtime::{Environment, TaskContext};
use thiserror::Error;

/// Errors from plugin construction or lifecycle hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),
    #[error("invalid plugin payload: {0}")]
    MalformedPayload(String),
    #[error("schema error: {0}")]
    Schema(#[from] PayloadError),
    #[error("plugin hook failed: {0}")]
    Hook(String),
}

/// Dependencies handed to every plugin factory.
#[derive(Clone)]
pub struct PluginOptions {
    pub environment: Environment,
    pub engine: Arc<dyn Engine>,
}

/// Per-task inputs for [`Plugin::new_task_plugin`].
#[derive(Clone)]
pub struct TaskPluginOptions {
    pub task_info: TaskInfo,
    /// Plugin payload, already validated by the pipeline's schema.
    pub payload: Value,
}

/// The long-lived side of a plugin.
///
/// Shared across all runners; implementations must be safe for concurrent
/// use across tasks.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Schema for this plugin's part of the task payload.
    fn payload_schema(&self) -> Result<PayloadSchema, PluginError>;

    /// Create the per-task plugin for one run.
    async fn new_task_plugin(
        &self,
        options: TaskPluginOptions,
    ) -> Result<Box<dyn TaskPlugin>, PluginError>;
}

/// Lifecycle hooks around one task run, called strictly in order.
///
/// Hooks never run concurrently for the same task. `dispose` must be
/// idempotent and tolerate being called after an earlier hook failed.
#[async_trait]
pub trait TaskPlugin: Send {
    /// Before any sandbox work.
    async fn prepare(&mut self, _context: &TaskContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Mutate the sandbox builder before the sandbox starts.
    async fn build_sandbox(
        &mut self,
        _builder: &mut dyn SandboxBuilder,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// The sandbox is running.
    async fn started(&mut self, _sandbox: &dyn Sandbox) -> Result<(), PluginError> {
        Ok(())
    }

    /// The sandbox finished; decide whether the task succeeded.
    async fn stopped(&mut self, _result: &dyn ResultSet) -> Result<bool, PluginError> {
        Ok(true)
    }

    /// Report the final resolution out-of-band.
    async fn finished(&mut self, _success: bool) -> Result<(), PluginError> {
        Ok(())
    }

    /// Release per-task plugin resources.
    async fn dispose(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn TaskPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn TaskPlugin")
    }
}
