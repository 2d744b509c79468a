//! Shared harness for manager specs.
//!
//! Builds a manager wired to fakes and exposes the handles the specs
//! assert against. All specs run with paused tokio time: sleeps auto-advance
//! the clock, so polling-interval ticks are deterministic.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use stint_core::test_support::task_run;
use stint_core::{Credentials, TaskRun, WorkerConfig};
use stint_engine::FakeEngine;
use stint_plugins::FakePlugin;
use stint_runtime::{Environment, TemporaryStorage};
pub use stint_worker::ShutdownSummary;
use stint_worker::{FakeQueue, Manager};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Harness {
    pub _dir: tempfile::TempDir,
    pub manager: Arc<Manager>,
    pub queue: FakeQueue,
    pub engine: FakeEngine,
    pub plugin: FakePlugin,
}

pub fn config(capacity: usize, polling_interval: u64) -> WorkerConfig {
    WorkerConfig {
        capacity,
        polling_interval,
        provisioner_id: "spec-provisioner".to_string(),
        worker_group: "spec-group".to_string(),
        worker_id: "spec-worker".to_string(),
        credentials: Credentials {
            client_id: "client".to_string(),
            access_token: "token".to_string(),
            certificate: None,
        },
        queue_service: Default::default(),
        plugins: Default::default(),
    }
}

pub fn harness(capacity: usize) -> Harness {
    harness_with(capacity, FakeEngine::new(), FakePlugin::new())
}

pub fn harness_with(capacity: usize, engine: FakeEngine, plugin: FakePlugin) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let queue = FakeQueue::new();
    let environment = Environment {
        storage: TemporaryStorage::new(dir.path().join("scratch")).unwrap(),
    };
    let manager = Manager::with_plugins(
        &config(capacity, 1),
        Arc::new(engine.clone()),
        Arc::new(plugin.clone()),
        environment,
        Arc::new(queue.clone()),
    )
    .unwrap();
    Harness {
        _dir: dir,
        manager: Arc::new(manager),
        queue,
        engine,
        plugin,
    }
}

impl Harness {
    /// Spawn the admission loop; returns the stop handle and the join
    /// handle resolving to the shutdown summary.
    pub fn start(&self) -> (watch::Sender<bool>, JoinHandle<ShutdownSummary>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let manager = Arc::clone(&self.manager);
        let handle = tokio::spawn(async move { manager.run(stop_rx).await });
        (stop_tx, handle)
    }

    /// A task whose payload satisfies both fake schemas.
    pub fn task(&self, task_id: &str, run_id: u32) -> TaskRun {
        task_run(task_id, run_id, json!({"e": 1, "p": 2}))
    }

    pub fn task_with_payload(&self, task_id: &str, payload: Value) -> TaskRun {
        task_run(task_id, 0, payload)
    }

    /// Whether the scratch root is free of leftover task directories.
    pub fn scratch_is_empty(&self) -> bool {
        let root = self._dir.path().join("scratch");
        std::fs::read_dir(root)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}
