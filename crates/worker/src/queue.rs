// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue service contract.

use async_trait::async_trait;
use stint_core::TaskRun;

/// Supplies claimed task descriptors in bounded batches.
///
/// Claim errors are internal to the service (it retries or returns an empty
/// batch); they never propagate to the manager.
#[async_trait]
pub trait QueueService: Send + Sync + 'static {
    /// Claim up to `max` tasks. Blocking call; returns an empty batch when
    /// the queue is idle and never more than `max` entries.
    async fn claim_work(&self, max: usize) -> Vec<TaskRun>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeQueue;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    //! Fake queue for deterministic testing
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::QueueService;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use stint_core::TaskRun;

    /// Fake queue backed by a scripted claim list.
    ///
    /// Records the `max` argument of every `claim_work` call. Cloning shares
    /// all state.
    #[derive(Clone, Default)]
    pub struct FakeQueue {
        inner: Arc<Mutex<FakeQueueState>>,
    }

    #[derive(Default)]
    struct FakeQueueState {
        pending: VecDeque<TaskRun>,
        claim_calls: Vec<usize>,
    }

    impl FakeQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Append a task the next claim can lease.
        pub fn push(&self, task: TaskRun) {
            self.inner.lock().pending.push_back(task);
        }

        /// The `max` argument of every claim call so far.
        pub fn claim_calls(&self) -> Vec<usize> {
            self.inner.lock().claim_calls.clone()
        }

        pub fn pending_len(&self) -> usize {
            self.inner.lock().pending.len()
        }
    }

    #[async_trait]
    impl QueueService for FakeQueue {
        async fn claim_work(&self, max: usize) -> Vec<TaskRun> {
            let mut state = self.inner.lock();
            state.claim_calls.push(max);
            let n = max.min(state.pending.len());
            state.pending.drain(..n).collect()
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
