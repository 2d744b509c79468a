// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stint-engine: the sandbox capability contract
//!
//! An engine turns a validated engine payload into an isolated sandbox and
//! surfaces the result of running it. The worker core only ever talks to
//! these traits; concrete isolation technology (VMs, containers, native
//! processes) lives behind them.

mod error;

pub use error::EngineError;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeEngine, FakeResultSet, ResultGate};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use stint_core::PayloadSchema;
use stint_runtime::TaskContext;

/// Options for creating a sandbox builder.
pub struct SandboxOptions {
    pub context: Arc<TaskContext>,
    /// Engine payload, already validated by the engine's schema.
    pub payload: Value,
}

/// Factory for sandboxes.
///
/// Shared across all runners; implementations must be safe for concurrent
/// use.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Schema for the engine's part of the task payload. Static for the
    /// engine's lifetime.
    fn payload_schema(&self) -> &PayloadSchema;

    /// Create the scaffold for a new sandbox.
    async fn new_sandbox_builder(
        &self,
        options: SandboxOptions,
    ) -> Result<Box<dyn SandboxBuilder>, EngineError>;
}

/// A sandbox under construction.
///
/// Plugins may mutate the builder before the runner starts it.
#[async_trait]
pub trait SandboxBuilder: Send {
    /// Set an environment variable inside the future sandbox.
    fn set_env_var(&mut self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Start the sandbox. The builder is consumed.
    async fn start_sandbox(self: Box<Self>) -> Result<Box<dyn Sandbox>, EngineError>;
}

/// A running sandbox.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Wait for the task body to finish. Single-shot; may block for as long
    /// as the task runs, subject to the task deadline. Must observe context
    /// cancellation and return [`EngineError::Cancelled`] promptly.
    async fn wait_for_result(self: Box<Self>) -> Result<Box<dyn ResultSet>, EngineError>;
}

/// Outcome of a finished sandbox.
pub trait ResultSet: Send + Sync {
    /// Whether the task body succeeded.
    fn success(&self) -> bool;
}

impl std::fmt::Debug for dyn SandboxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn SandboxBuilder")
    }
}

impl std::fmt::Debug for dyn Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Sandbox")
    }
}

impl std::fmt::Debug for dyn ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ResultSet")
    }
}
