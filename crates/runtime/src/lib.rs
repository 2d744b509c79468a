// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stint-runtime: per-task execution environment
//!
//! Everything a single task run owns while it is alive: a scratch directory,
//! a log sink, and a cancellation signal. The read side ([`TaskContext`]) is
//! shared with plugins and the engine; the write side ([`TaskController`])
//! stays with the runner and drives cleanup.

pub mod context;
pub mod scratch;

pub use context::{new_task_context, ContextError, TaskContext, TaskController};
pub use scratch::{Environment, TemporaryStorage};
