// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task lifecycle execution.
//!
//! One runner drives one claimed task through the fixed phase sequence
//! (register, allocate context, parse payloads, create plugins, prepare,
//! build, start, wait, stop, finish) and guarantees ordered cleanup from
//! whatever point the lifecycle reached. Every successful acquisition
//! pushes its inverse onto a cleanup stack; unwinding pops the stack and
//! runs each inverse, tolerating the others' failures.

use crate::dispatch::{self, DispatchError};
use crate::registry::{Registry, RegistryError};
use std::fmt;
use std::sync::Arc;
use stint_core::TaskRun;
use stint_engine::{Engine, EngineError, SandboxOptions};
use stint_plugins::{Plugin, PluginError, TaskPlugin, TaskPluginOptions};
use stint_runtime::{new_task_context, ContextError, Environment, TaskController};
use thiserror::Error;
use tokio::sync::oneshot;

/// Lifecycle phase, named in task error logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Register,
    AllocateContext,
    ParsePayloads,
    CreatePlugins,
    Prepare,
    BuildSandboxBuilder,
    BuildSandbox,
    StartSandbox,
    Started,
    WaitForResult,
    Stopped,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Register => "register",
            Phase::AllocateContext => "allocate_context",
            Phase::ParsePayloads => "parse_payloads",
            Phase::CreatePlugins => "create_plugins",
            Phase::Prepare => "prepare",
            Phase::BuildSandboxBuilder => "build_sandbox_builder",
            Phase::BuildSandbox => "build_sandbox",
            Phase::StartSandbox => "start_sandbox",
            Phase::Started => "started",
            Phase::WaitForResult => "wait_for_result",
            Phase::Stopped => "stopped",
            Phase::Finished => "finished",
        };
        write!(f, "{name}")
    }
}

/// A task failure annotated with the phase that produced it.
#[derive(Debug, Error)]
#[error("{phase}: {source}")]
pub struct RunError {
    pub phase: Phase,
    #[source]
    pub source: TaskFailure,
}

impl RunError {
    fn at<E: Into<TaskFailure>>(phase: Phase) -> impl FnOnce(E) -> RunError {
        move |error| RunError {
            phase,
            source: error.into(),
        }
    }
}

/// The underlying failure from a lifecycle collaborator.
#[derive(Debug, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Terminal outcome of one task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Full lifecycle completed; the task resolved with this success flag.
    Completed { success: bool },
    /// The lifecycle failed at a phase; cleanup ran from there.
    Failed { phase: Phase },
    /// The composite key was already registered. Nothing was acquired, so
    /// nothing was cleaned up; the first runner is unaffected.
    Rejected,
}

/// Inverse of one acquisition, pushed when the acquisition succeeds.
enum CleanupStep {
    DisposePlugins,
    CloseLog,
    DisposeContext,
    Deregister,
}

/// Resources the cleanup stack unwinds over.
struct CleanupState {
    steps: Vec<CleanupStep>,
    controller: Option<TaskController>,
    plugins: Option<Box<dyn TaskPlugin>>,
}

/// Executes the per-task lifecycle state machine.
///
/// Shared across all runs; per-run state lives on the stack of [`run`]
/// (TaskRunner::run).
pub struct TaskRunner {
    registry: Arc<Registry>,
    engine: Arc<dyn Engine>,
    plugins: Arc<dyn Plugin>,
    environment: Environment,
}

impl TaskRunner {
    pub fn new(
        registry: Arc<Registry>,
        engine: Arc<dyn Engine>,
        plugins: Arc<dyn Plugin>,
        environment: Environment,
    ) -> Self {
        Self {
            registry,
            engine,
            plugins,
            environment,
        }
    }

    /// Run one claimed task to completion.
    ///
    /// `registered` resolves as soon as the registration attempt is done,
    /// so the admission loop can observe the occupied slot before its next
    /// tick. Per-task errors are logged with `{task_id, run_id, phase}` and
    /// absorbed here; only the outcome escapes.
    pub async fn run(&self, task: TaskRun, registered: oneshot::Sender<bool>) -> RunOutcome {
        tracing::info!(task_id = %task.task_id, run_id = task.run_id, "running task");

        // CLAIMED → REGISTERED. A conflict aborts before anything was
        // acquired; the sender is notified either way.
        if let Err(error) = self.registry.register(&task) {
            let _ = registered.send(false);
            tracing::warn!(
                task_id = %task.task_id,
                run_id = task.run_id,
                phase = %Phase::Register,
                %error,
                "could not register task"
            );
            return RunOutcome::Rejected;
        }
        let _ = registered.send(true);

        let mut cleanup = CleanupState {
            steps: vec![CleanupStep::Deregister],
            controller: None,
            plugins: None,
        };

        let result = self.execute(&task, &mut cleanup).await;

        // The success path's disposal and the failure path's cleanup are the
        // same unwind; only the stack depth differs.
        self.unwind(&task, cleanup).await;

        match result {
            Ok(success) => RunOutcome::Completed { success },
            Err(error) => {
                tracing::warn!(
                    task_id = %task.task_id,
                    run_id = task.run_id,
                    phase = %error.phase,
                    error = %error.source,
                    "task failed"
                );
                RunOutcome::Failed { phase: error.phase }
            }
        }
    }

    /// Drive the lifecycle from REGISTERED to FINISHED.
    ///
    /// Each transition is one external call; the first failure returns and
    /// leaves `cleanup` holding exactly the inverses of what succeeded.
    async fn execute(
        &self,
        task: &TaskRun,
        cleanup: &mut CleanupState,
    ) -> Result<bool, RunError> {
        // REGISTERED → CONTEXT_READY. The pair constructor removes the
        // scratch directory itself when the log cannot be opened, so a
        // failure here leaves only the registration to unwind.
        let scratch = self.environment.storage.scratch_path();
        let (context, controller) =
            new_task_context(task.info(), scratch).map_err(RunError::at(Phase::AllocateContext))?;
        let context = Arc::new(context);
        cleanup.controller = Some(controller);
        cleanup.steps.push(CleanupStep::DisposeContext);
        cleanup.steps.push(CleanupStep::CloseLog);

        // CONTEXT_READY → PAYLOADS_PARSED
        let (engine_payload, plugin_payload) = dispatch::split_payload(
            self.engine.as_ref(),
            self.plugins.as_ref(),
            &task.definition.payload,
        )
        .map_err(RunError::at(Phase::ParsePayloads))?;

        // PAYLOADS_PARSED → PLUGINS_CREATED
        let created = self
            .plugins
            .new_task_plugin(TaskPluginOptions {
                task_info: task.info(),
                payload: plugin_payload,
            })
            .await
            .map_err(RunError::at(Phase::CreatePlugins))?;
        cleanup.steps.push(CleanupStep::DisposePlugins);
        let plugins = cleanup.plugins.insert(created);

        // PLUGINS_CREATED → PREPARED
        plugins
            .prepare(&context)
            .await
            .map_err(RunError::at(Phase::Prepare))?;

        // PREPARED → SANDBOX_BUILT
        let mut builder = self
            .engine
            .new_sandbox_builder(SandboxOptions {
                context: Arc::clone(&context),
                payload: engine_payload,
            })
            .await
            .map_err(RunError::at(Phase::BuildSandboxBuilder))?;

        plugins
            .build_sandbox(builder.as_mut())
            .await
            .map_err(RunError::at(Phase::BuildSandbox))?;

        // SANDBOX_BUILT → SANDBOX_STARTED. The builder is consumed.
        let sandbox = builder
            .start_sandbox()
            .await
            .map_err(RunError::at(Phase::StartSandbox))?;

        // SANDBOX_STARTED → STARTED_NOTIFIED
        plugins
            .started(sandbox.as_ref())
            .await
            .map_err(RunError::at(Phase::Started))?;

        // STARTED_NOTIFIED → RESULT_READY. A wait failure short-circuits to
        // cleanup; `stopped` is not invoked on a result that never
        // materialized.
        let result = sandbox
            .wait_for_result()
            .await
            .map_err(RunError::at(Phase::WaitForResult))?;

        // RESULT_READY → STOPPED_NOTIFIED. A hook error outranks a false
        // verdict.
        let success = plugins
            .stopped(result.as_ref())
            .await
            .map_err(RunError::at(Phase::Stopped))?;

        // STOPPED_NOTIFIED → FINISHED. `success = false` is a first-class
        // resolution and still gets reported.
        plugins
            .finished(success)
            .await
            .map_err(RunError::at(Phase::Finished))?;

        Ok(success)
    }

    /// Pop and run every inverse in reverse acquisition order. A failing
    /// inverse is logged and never aborts the remaining steps.
    async fn unwind(&self, task: &TaskRun, mut cleanup: CleanupState) {
        while let Some(step) = cleanup.steps.pop() {
            match step {
                CleanupStep::DisposePlugins => {
                    if let Some(plugins) = cleanup.plugins.as_mut() {
                        if let Err(error) = plugins.dispose().await {
                            tracing::warn!(
                                task_id = %task.task_id,
                                run_id = task.run_id,
                                %error,
                                "could not dispose plugins"
                            );
                        }
                    }
                }
                CleanupStep::CloseLog => {
                    if let Some(controller) = cleanup.controller.as_ref() {
                        if let Err(error) = controller.close_log() {
                            tracing::warn!(
                                task_id = %task.task_id,
                                run_id = task.run_id,
                                %error,
                                "could not properly close task log"
                            );
                        }
                    }
                }
                CleanupStep::DisposeContext => {
                    if let Some(controller) = cleanup.controller.as_ref() {
                        if let Err(error) = controller.dispose() {
                            tracing::warn!(
                                task_id = %task.task_id,
                                run_id = task.run_id,
                                %error,
                                "could not dispose of task context"
                            );
                        }
                    }
                }
                CleanupStep::Deregister => {
                    if let Err(error) = self.registry.deregister(task) {
                        tracing::warn!(
                            task_id = %task.task_id,
                            run_id = task.run_id,
                            %error,
                            "could not deregister task"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
