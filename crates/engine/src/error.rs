// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for engine operations

use thiserror::Error;

/// Errors surfaced by an engine across the sandbox lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed engine payload: {0}")]
    MalformedPayload(String),
    #[error("could not build sandbox: {0}")]
    Build(String),
    #[error("could not start sandbox: {0}")]
    Start(String),
    #[error("task was cancelled")]
    Cancelled,
    #[error("engine internal error: {0}")]
    Internal(String),
}
