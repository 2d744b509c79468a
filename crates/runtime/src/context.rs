// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task context and controller.
//!
//! [`new_task_context`] creates the pair for one task run. The context is
//! handed out as `Arc<TaskContext>` and must only ever be read; the
//! controller's two cleanup operations (`close_log`, `dispose`) are
//! idempotent so the cleanup path can call them unconditionally.

use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stint_core::TaskInfo;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from context allocation.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not create scratch directory {path}: {source}")]
    CreateScratch {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not open task log {path}: {source}")]
    OpenLog {
        path: PathBuf,
        source: std::io::Error,
    },
}

const TASK_LOG_NAME: &str = "task.log";

type SharedLog = Arc<Mutex<Option<BufWriter<File>>>>;

/// Read-mostly handle passed to plugins and the engine.
///
/// Carries task identity, the writable log sink, the scratch location, and
/// the cancellation signal.
#[derive(Debug)]
pub struct TaskContext {
    info: TaskInfo,
    scratch_dir: PathBuf,
    log: SharedLog,
    cancelled: watch::Receiver<bool>,
}

/// Write-side counterpart to [`TaskContext`].
///
/// Created as a pair with its context; the two share the log sink and the
/// scratch directory lifetime.
#[derive(Debug)]
pub struct TaskController {
    scratch_dir: PathBuf,
    log: SharedLog,
    cancel: watch::Sender<bool>,
}

/// Create a context/controller pair rooted at `scratch_dir`.
///
/// The directory is created and the task log opened inside it. If the log
/// cannot be opened the directory is removed again before the error
/// returns, so a failed allocation leaves nothing to clean up.
pub fn new_task_context(
    info: TaskInfo,
    scratch_dir: PathBuf,
) -> Result<(TaskContext, TaskController), ContextError> {
    fs::create_dir_all(&scratch_dir).map_err(|source| ContextError::CreateScratch {
        path: scratch_dir.clone(),
        source,
    })?;

    let log_path = scratch_dir.join(TASK_LOG_NAME);
    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(source) => {
            let _ = fs::remove_dir_all(&scratch_dir);
            return Err(ContextError::OpenLog {
                path: log_path,
                source,
            });
        }
    };

    let log: SharedLog = Arc::new(Mutex::new(Some(BufWriter::new(file))));
    let (cancel, cancelled) = watch::channel(false);

    Ok((
        TaskContext {
            info,
            scratch_dir: scratch_dir.clone(),
            log: Arc::clone(&log),
            cancelled,
        },
        TaskController {
            scratch_dir,
            log,
            cancel,
        },
    ))
}

impl TaskContext {
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.scratch_dir.join(TASK_LOG_NAME)
    }

    /// Append a line to the task log.
    ///
    /// Best-effort: a write failure is traced and dropped, and a line logged
    /// after `close_log` is silently discarded.
    pub fn log(&self, line: &str) {
        let mut guard = self.log.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(error) = writeln!(writer, "{line}") {
                tracing::warn!(
                    task_id = %self.info.task_id,
                    run_id = self.info.run_id,
                    %error,
                    "task log write failed"
                );
            }
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Wait until cancellation is requested.
    ///
    /// If the controller is gone without ever cancelling, the task can no
    /// longer be cancelled and this future never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl TaskController {
    /// Request cancellation. Engines must observe this in `wait_for_result`
    /// and return promptly.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Flush and close the task log. Idempotent.
    pub fn close_log(&self) -> std::io::Result<()> {
        let mut guard = self.log.lock();
        match guard.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Remove the scratch directory and everything in it. Idempotent; a
    /// missing directory is success.
    pub fn dispose(&self) -> std::io::Result<()> {
        match fs::remove_dir_all(&self.scratch_dir) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
