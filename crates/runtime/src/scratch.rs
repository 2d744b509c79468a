// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Temporary storage allocation.

use std::fs;
use std::path::{Path, PathBuf};

/// Allocator for per-task scratch directories under a single root.
#[derive(Debug, Clone)]
pub struct TemporaryStorage {
    root: PathBuf,
}

impl TemporaryStorage {
    /// Root the storage at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Allocate a fresh path under the root. Nothing is created yet; the
    /// caller owns the path from here.
    pub fn scratch_path(&self) -> PathBuf {
        self.root.join(uuid::Uuid::new_v4().to_string())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Shared runtime dependencies handed to plugin construction and runners.
#[derive(Debug, Clone)]
pub struct Environment {
    pub storage: TemporaryStorage,
}

#[cfg(test)]
#[path = "scratch_tests.rs"]
mod tests;
