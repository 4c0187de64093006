// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scratch directory handling for `(sheep, job)` pairs.

use shepherd_core::JobId;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Create a directory, deleting its contents first if it exists.
pub fn create_clean_dir(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    std::fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Scratch directory of a job on a sheep.
pub fn job_workdir(sheep_data_root: &Path, job_id: &JobId) -> PathBuf {
    sheep_data_root.join(job_id.as_str())
}

/// Remove a scratch directory, logging instead of failing.
pub fn remove_workdir(path: &Path) {
    if let Err(err) = std::fs::remove_dir_all(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove working directory");
        }
    }
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
