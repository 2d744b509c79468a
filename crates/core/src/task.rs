// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity, definition, and claim data model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a task.
    ///
    /// A task may be attempted several times; each attempt is a run, and the
    /// `(task_id, run_id)` pair identifies one attempt.
    pub struct TaskId;
}

/// A claimed unit of work leased from the queue.
///
/// Created by the queue service when a claim succeeds, destroyed when the
/// runner's cleanup completes. The composite [`key`](TaskRun::key) is unique
/// among in-flight tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub task_id: TaskId,
    pub run_id: u32,
    pub definition: TaskDefinition,
    pub claim: Claim,
}

impl TaskRun {
    /// Composite registry key, `"{taskId}/{runId}"`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.task_id, self.run_id)
    }

    /// Read-only identity snapshot handed to plugins and the task context.
    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            task_id: self.task_id.clone(),
            run_id: self.run_id,
            deadline_ms: self.definition.deadline_ms,
        }
    }
}

/// What the queue handed us for one run: the opaque payload plus timing
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Opaque payload, split between the engine and the plugin pipeline by
    /// their schemas.
    pub payload: Value,
    /// Task deadline, epoch milliseconds. Enforced by the engine via the
    /// task context, not by the runner.
    pub deadline_ms: u64,
    /// Definition expiry, epoch milliseconds.
    pub expires_ms: u64,
}

/// Lease data for a claimed run.
///
/// The token is opaque to the core; reporting plugins pass it back to the
/// queue as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_token: String,
    pub taken_until_ms: u64,
}

/// Identity snapshot of a task, safe to share across the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: TaskId,
    pub run_id: u32,
    pub deadline_ms: u64,
}

impl TaskInfo {
    /// Composite key, identical to [`TaskRun::key`] for the same task.
    pub fn key(&self) -> String {
        format!("{}/{}", self.task_id, self.run_id)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
