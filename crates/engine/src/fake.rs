// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake engine for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Engine, EngineError, ResultSet, Sandbox, SandboxBuilder, SandboxOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use stint_core::{FieldKind, PayloadSchema};
use stint_runtime::TaskContext;
use tokio::sync::Semaphore;

/// Fake engine for testing.
///
/// Allows programmatic failure injection per lifecycle phase and records
/// builder mutations and sandbox activity. Cloning shares all state.
#[derive(Clone)]
pub struct FakeEngine {
    schema: Arc<PayloadSchema>,
    inner: Arc<Mutex<FakeEngineState>>,
}

struct FakeEngineState {
    builder_error: Option<EngineError>,
    start_error: Option<EngineError>,
    wait_error: Option<EngineError>,
    result_success: bool,
    gate: Option<Arc<Semaphore>>,
    env_vars: Vec<(String, String, String)>,
    built: Vec<String>,
    started: Vec<String>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// Create a fake engine observing an optional `e` payload field.
    pub fn new() -> Self {
        Self::with_schema(
            PayloadSchema::part("fake-engine")
                .optional("e", FieldKind::Any)
                .build(),
        )
    }

    pub fn with_schema(schema: PayloadSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            inner: Arc::new(Mutex::new(FakeEngineState {
                builder_error: None,
                start_error: None,
                wait_error: None,
                result_success: true,
                gate: None,
                env_vars: Vec::new(),
                built: Vec::new(),
                started: Vec::new(),
            })),
        }
    }

    /// Fail the next `new_sandbox_builder` call.
    pub fn fail_next_builder(&self, message: &str) {
        self.inner.lock().builder_error = Some(EngineError::Build(message.to_string()));
    }

    /// Fail the next `start_sandbox` call.
    pub fn fail_next_start(&self, message: &str) {
        self.inner.lock().start_error = Some(EngineError::Start(message.to_string()));
    }

    /// Fail the next `wait_for_result` call.
    pub fn fail_next_wait(&self, message: &str) {
        self.inner.lock().wait_error = Some(EngineError::Internal(message.to_string()));
    }

    /// Set the success verdict every future sandbox reports.
    pub fn set_result_success(&self, success: bool) {
        self.inner.lock().result_success = success;
    }

    /// Hold every future sandbox's result until the gate releases it.
    pub fn gate_results(&self) -> ResultGate {
        let gate = Arc::new(Semaphore::new(0));
        self.inner.lock().gate = Some(Arc::clone(&gate));
        ResultGate { gate }
    }

    /// Environment variables set by plugins, as `(task key, name, value)`.
    pub fn env_vars(&self) -> Vec<(String, String, String)> {
        self.inner.lock().env_vars.clone()
    }

    /// Task keys for which a sandbox builder was created.
    pub fn built_keys(&self) -> Vec<String> {
        self.inner.lock().built.clone()
    }

    /// Task keys for which a sandbox was started.
    pub fn started_keys(&self) -> Vec<String> {
        self.inner.lock().started.clone()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn payload_schema(&self) -> &PayloadSchema {
        &self.schema
    }

    async fn new_sandbox_builder(
        &self,
        options: SandboxOptions,
    ) -> Result<Box<dyn SandboxBuilder>, EngineError> {
        let mut state = self.inner.lock();
        if let Some(error) = state.builder_error.take() {
            return Err(error);
        }
        let key = options.context.info().key();
        state.built.push(key.clone());
        Ok(Box::new(FakeSandboxBuilder {
            key,
            context: options.context,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FakeSandboxBuilder {
    key: String,
    context: Arc<TaskContext>,
    inner: Arc<Mutex<FakeEngineState>>,
}

#[async_trait]
impl SandboxBuilder for FakeSandboxBuilder {
    fn set_env_var(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.inner
            .lock()
            .env_vars
            .push((self.key.clone(), name.to_string(), value.to_string()));
        Ok(())
    }

    async fn start_sandbox(self: Box<Self>) -> Result<Box<dyn Sandbox>, EngineError> {
        let gate = {
            let mut state = self.inner.lock();
            if let Some(error) = state.start_error.take() {
                return Err(error);
            }
            state.started.push(self.key.clone());
            state.gate.clone()
        };
        Ok(Box::new(FakeSandbox {
            context: self.context,
            gate,
            inner: self.inner,
        }))
    }
}

struct FakeSandbox {
    context: Arc<TaskContext>,
    gate: Option<Arc<Semaphore>>,
    inner: Arc<Mutex<FakeEngineState>>,
}

#[async_trait]
impl Sandbox for FakeSandbox {
    async fn wait_for_result(self: Box<Self>) -> Result<Box<dyn ResultSet>, EngineError> {
        if let Some(gate) = &self.gate {
            tokio::select! {
                _ = self.context.cancelled() => return Err(EngineError::Cancelled),
                permit = gate.acquire() => match permit {
                    Ok(permit) => permit.forget(),
                    Err(_) => return Err(EngineError::Internal("result gate closed".to_string())),
                },
            }
        } else if self.context.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let mut state = self.inner.lock();
        if let Some(error) = state.wait_error.take() {
            return Err(error);
        }
        Ok(Box::new(FakeResultSet {
            success: state.result_success,
        }))
    }
}

/// Plain result set, also usable directly in other crates' tests.
pub struct FakeResultSet {
    success: bool,
}

impl FakeResultSet {
    pub fn new(success: bool) -> Self {
        Self { success }
    }
}

impl ResultSet for FakeResultSet {
    fn success(&self) -> bool {
        self.success
    }
}

/// Handle that releases sandbox results held by [`FakeEngine::gate_results`].
pub struct ResultGate {
    gate: Arc<Semaphore>,
}

impl ResultGate {
    /// Let `n` held sandboxes produce their result.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
