// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake plugin for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::{Plugin, PluginError, TaskPlugin, TaskPluginOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use stint_core::{FieldKind, PayloadSchema};
use stint_engine::{ResultSet, Sandbox, SandboxBuilder};
use stint_runtime::TaskContext;

/// Fake plugin for testing.
///
/// Records every hook invocation across all task plugins it creates (the
/// shared trace makes ordering assertions possible), and allows per-hook
/// failure injection. Cloning shares all state.
#[derive(Clone)]
pub struct FakePlugin {
    schema: Arc<PayloadSchema>,
    inner: Arc<Mutex<FakePluginState>>,
}

#[derive(Default)]
struct FakePluginState {
    trace: Vec<String>,
    payloads: Vec<(String, Value)>,
    fail_construction: bool,
    fail_prepare: bool,
    fail_build_sandbox: bool,
    fail_started: bool,
    fail_stopped: bool,
    fail_finished: bool,
    fail_dispose: bool,
    /// Verdict returned by `stopped`; `None` mirrors the sandbox result.
    stopped_verdict: Option<bool>,
}

impl Default for FakePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlugin {
    /// Create a fake plugin observing an optional `p` payload field.
    pub fn new() -> Self {
        Self::with_schema(
            PayloadSchema::part("fake-plugin")
                .optional("p", FieldKind::Any)
                .build(),
        )
    }

    pub fn with_schema(schema: PayloadSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            inner: Arc::new(Mutex::new(FakePluginState::default())),
        }
    }

    /// The full hook trace, entries formatted as `"{taskId}/{runId}:{hook}"`.
    pub fn trace(&self) -> Vec<String> {
        self.inner.lock().trace.clone()
    }

    /// Hook names recorded for one task, in invocation order.
    pub fn trace_for(&self, key: &str) -> Vec<String> {
        let prefix = format!("{key}:");
        self.inner
            .lock()
            .trace
            .iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// The payload passed to `new_task_plugin` for one task.
    pub fn payload_for(&self, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .payloads
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, payload)| payload.clone())
    }

    pub fn fail_construction(&self) {
        self.inner.lock().fail_construction = true;
    }

    pub fn fail_prepare(&self) {
        self.inner.lock().fail_prepare = true;
    }

    pub fn fail_build_sandbox(&self) {
        self.inner.lock().fail_build_sandbox = true;
    }

    pub fn fail_started(&self) {
        self.inner.lock().fail_started = true;
    }

    pub fn fail_stopped(&self) {
        self.inner.lock().fail_stopped = true;
    }

    pub fn fail_finished(&self) {
        self.inner.lock().fail_finished = true;
    }

    pub fn fail_dispose(&self) {
        self.inner.lock().fail_dispose = true;
    }

    /// Force the `stopped` verdict instead of mirroring the sandbox result.
    pub fn set_stopped_verdict(&self, verdict: bool) {
        self.inner.lock().stopped_verdict = Some(verdict);
    }
}

#[async_trait]
impl Plugin for FakePlugin {
    fn payload_schema(&self) -> Result<PayloadSchema, PluginError> {
        Ok((*self.schema).clone())
    }

    async fn new_task_plugin(
        &self,
        options: TaskPluginOptions,
    ) -> Result<Box<dyn TaskPlugin>, PluginError> {
        let key = options.task_info.key();
        let mut state = self.inner.lock();
        if state.fail_construction {
            return Err(PluginError::Hook("injected construction failure".to_string()));
        }
        state.payloads.push((key.clone(), options.payload));
        Ok(Box::new(FakeTaskPlugin {
            key,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FakeTaskPlugin {
    key: String,
    inner: Arc<Mutex<FakePluginState>>,
}

impl FakeTaskPlugin {
    fn record(&self, hook: &str) {
        self.inner.lock().trace.push(format!("{}:{hook}", self.key));
    }

    fn injected(hook: &str) -> PluginError {
        PluginError::Hook(format!("injected {hook} failure"))
    }
}

#[async_trait]
impl TaskPlugin for FakeTaskPlugin {
    async fn prepare(&mut self, _context: &TaskContext) -> Result<(), PluginError> {
        self.record("prepare");
        if self.inner.lock().fail_prepare {
            return Err(Self::injected("prepare"));
        }
        Ok(())
    }

    async fn build_sandbox(&mut self, _builder: &mut dyn SandboxBuilder) -> Result<(), PluginError> {
        self.record("build_sandbox");
        if self.inner.lock().fail_build_sandbox {
            return Err(Self::injected("build_sandbox"));
        }
        Ok(())
    }

    async fn started(&mut self, _sandbox: &dyn Sandbox) -> Result<(), PluginError> {
        self.record("started");
        if self.inner.lock().fail_started {
            return Err(Self::injected("started"));
        }
        Ok(())
    }

    async fn stopped(&mut self, result: &dyn ResultSet) -> Result<bool, PluginError> {
        self.record("stopped");
        let state = self.inner.lock();
        if state.fail_stopped {
            return Err(Self::injected("stopped"));
        }
        Ok(state.stopped_verdict.unwrap_or_else(|| result.success()))
    }

    async fn finished(&mut self, success: bool) -> Result<(), PluginError> {
        self.record(if success {
            "finished(true)"
        } else {
            "finished(false)"
        });
        if self.inner.lock().fail_finished {
            return Err(Self::injected("finished"));
        }
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), PluginError> {
        self.record("dispose");
        if self.inner.lock().fail_dispose {
            return Err(Self::injected("dispose"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
