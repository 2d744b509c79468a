// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates' tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Claim, TaskDefinition, TaskId, TaskRun};
use serde_json::Value;

/// Build a claimed task with the given identity and payload.
pub fn task_run(task_id: &str, run_id: u32, payload: Value) -> TaskRun {
    TaskRun {
        task_id: TaskId::new(task_id),
        run_id,
        definition: TaskDefinition {
            payload,
            deadline_ms: 2_000_000,
            expires_ms: 3_000_000,
        },
        claim: Claim {
            claim_token: format!("claim-{task_id}-{run_id}"),
            taken_until_ms: 1_500_000,
        },
    }
}
