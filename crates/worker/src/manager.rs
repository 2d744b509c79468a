// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control loop.
//!
//! The loop ticks on the polling interval, claims work up to its free
//! capacity, and spawns a runner per claim into a `JoinSet` so shutdown can
//! await the stragglers. Ticks are serialized; runners are not.

use crate::queue::QueueService;
use crate::registry::Registry;
use crate::runner::{RunOutcome, TaskRunner};
use std::sync::Arc;
use std::time::Duration;
use stint_core::{ConfigError, WorkerConfig};
use stint_engine::Engine;
use stint_plugins::{Plugin, PluginError, PluginManager, PluginOptions};
use stint_runtime::Environment;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// Errors that reach the manager's caller. Everything at task scope is
/// absorbed by the runners.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("could not create plugin manager: {0}")]
    PluginConstruction(#[from] PluginError),
}

/// Aggregated runner outcomes, reported when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// Runs that completed the full lifecycle (successfully resolved or
    /// not).
    pub completed: usize,
    /// Runs that failed at some phase and were cleaned up.
    pub failed: usize,
    /// Claims rejected for an already-registered key.
    pub rejected: usize,
}

/// The task manager: claims work, runs it, and reports on shutdown.
pub struct Manager {
    capacity: usize,
    interval: Duration,
    queue: Arc<dyn QueueService>,
    registry: Arc<Registry>,
    runner: Arc<TaskRunner>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("capacity", &self.capacity)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Create a manager from validated configuration.
    ///
    /// The plugin pipeline is built from `plugins.enabled` through the
    /// factory table; an unknown name or invalid configuration is fatal
    /// here.
    pub fn new(
        config: &WorkerConfig,
        engine: Arc<dyn Engine>,
        environment: Environment,
        queue: Arc<dyn QueueService>,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        let plugin_manager = PluginManager::new(
            &config.plugins.enabled,
            &PluginOptions {
                environment: environment.clone(),
                engine: Arc::clone(&engine),
            },
        )?;
        Ok(Self::assemble(config, engine, Arc::new(plugin_manager), environment, queue))
    }

    /// Create a manager with an explicit plugin pipeline, bypassing the
    /// factory table. For tests that compose fakes.
    #[cfg(any(test, feature = "test-support"))]
    pub fn with_plugins(
        config: &WorkerConfig,
        engine: Arc<dyn Engine>,
        plugins: Arc<dyn Plugin>,
        environment: Environment,
        queue: Arc<dyn QueueService>,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        Ok(Self::assemble(config, engine, plugins, environment, queue))
    }

    fn assemble(
        config: &WorkerConfig,
        engine: Arc<dyn Engine>,
        plugins: Arc<dyn Plugin>,
        environment: Environment,
        queue: Arc<dyn QueueService>,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        let runner = Arc::new(TaskRunner::new(
            Arc::clone(&registry),
            engine,
            plugins,
            environment,
        ));
        Self {
            capacity: config.capacity,
            interval: Duration::from_secs(config.polling_interval),
            queue,
            registry,
            runner,
        }
    }

    /// The in-flight task registry.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Run the admission loop until `stop` signals, then await outstanding
    /// runners and report the aggregated outcomes.
    ///
    /// Stopping is idempotent: repeated signals and a dropped sender both
    /// land in the same stopping path. No new ticks fire after stop;
    /// already-spawned runners run to completion.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> ShutdownSummary {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            capacity = self.capacity,
            "polling for tasks"
        );

        let mut summary = ShutdownSummary::default();
        let mut runners: JoinSet<RunOutcome> = JoinSet::new();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    match changed {
                        Ok(()) => {
                            if *stop.borrow_and_update() {
                                break;
                            }
                        }
                        // The stop sender is gone; nothing can signal us
                        // anymore, so stop rather than run unsupervised.
                        Err(_) => break,
                    }
                }
                _ = ticker.tick() => {
                    self.tick(&mut runners).await;
                }
                Some(joined) = runners.join_next(), if !runners.is_empty() => {
                    Self::tally(&mut summary, joined);
                }
            }
        }

        tracing::info!(outstanding = runners.len(), "stopping; waiting for runners");
        while let Some(joined) = runners.join_next().await {
            Self::tally(&mut summary, joined);
        }

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            rejected = summary.rejected,
            "admission loop stopped"
        );
        summary
    }

    /// One admission tick: claim up to the free capacity and dispatch.
    async fn tick(&self, runners: &mut JoinSet<RunOutcome>) {
        let free = self.capacity.saturating_sub(self.registry.len());
        if free == 0 {
            return;
        }

        let claims = self.queue.claim_work(free).await;
        for task in claims {
            let runner = Arc::clone(&self.runner);
            let (registered_tx, registered_rx) = oneshot::channel();
            runners.spawn(async move { runner.run(task, registered_tx).await });
            // Wait for the registration attempt so the next capacity
            // computation observes this task's slot.
            let _ = registered_rx.await;
        }
    }

    fn tally(
        summary: &mut ShutdownSummary,
        joined: Result<RunOutcome, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(RunOutcome::Completed { .. }) => summary.completed += 1,
            Ok(RunOutcome::Failed { .. }) => summary.failed += 1,
            Ok(RunOutcome::Rejected) => summary.rejected += 1,
            Err(error) => {
                tracing::error!(%error, "runner task aborted");
                summary.failed += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
