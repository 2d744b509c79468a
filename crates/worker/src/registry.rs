// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight task registry.
//!
//! Tracks every task between its runner's `register` and `deregister`. The
//! map is never exposed; all access goes through the registry's own
//! operations, each O(1) under the internal mutex with no external calls
//! made while it is held.

use parking_lot::Mutex;
use std::collections::HashMap;
use stint_core::{TaskInfo, TaskRun};
use thiserror::Error;

/// Errors from registry operations. Neither variant ever panics the worker;
/// both are per-task conditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cannot register task {0}: task already exists")]
    AlreadyRegistered(String),
    #[error("cannot deregister task {0}: task does not exist")]
    NotRegistered(String),
}

/// Mutex-guarded map of in-flight tasks keyed by `"{taskId}/{runId}"`.
#[derive(Default)]
pub struct Registry {
    tasks: Mutex<HashMap<String, TaskInfo>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the task under its composite key.
    pub fn register(&self, task: &TaskRun) -> Result<(), RegistryError> {
        let key = task.key();
        tracing::debug!(task = %key, "registering task");
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered(key));
        }
        tasks.insert(key, task.info());
        Ok(())
    }

    /// Remove the task's composite key.
    pub fn deregister(&self, task: &TaskRun) -> Result<(), RegistryError> {
        let key = task.key();
        tracing::debug!(task = %key, "deregistering task");
        let mut tasks = self.tasks.lock();
        match tasks.remove(&key) {
            Some(_) => Ok(()),
            None => Err(RegistryError::NotRegistered(key)),
        }
    }

    /// Current number of in-flight tasks, consistent with the most recent
    /// successful register/deregister.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tasks.lock().contains_key(key)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
