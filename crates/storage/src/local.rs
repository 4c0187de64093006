// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed storage.
//!
//! One directory per job namespace under a common root. Matches the remote
//! layout exactly (`inputs/`, `outputs/`, `job_status.json`), which makes it
//! usable both as a single-host backend and as the test-suite store.

use crate::error::StorageError;
use crate::storage::Storage;
use async_trait::async_trait;
use shepherd_core::constants::{INPUT_DIR, JOB_STATUS_FILE, OUTPUT_DIR};
use shepherd_core::{JobId, JobStatus};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Storage over a local directory tree.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory all job namespaces live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.as_str())
    }

    /// Resolve a `/`-delimited object path inside a job namespace.
    fn object_path(&self, job_id: &JobId, path: &str) -> PathBuf {
        let mut resolved = self.job_dir(job_id);
        for part in path.split('/').filter(|p| !p.is_empty()) {
            resolved.push(part);
        }
        resolved
    }

    async fn require_job_dir(&self, job_id: &JobId) -> Result<PathBuf, StorageError> {
        let dir = self.job_dir(job_id);
        if !fs::try_exists(&dir).await.map_err(|e| remote("stat job namespace", &e))? {
            return Err(StorageError::Remote(format!(
                "job namespace `{job_id}` does not exist"
            )));
        }
        Ok(dir)
    }
}

fn remote(context: &str, err: &io::Error) -> StorageError {
    StorageError::Remote(format!("{context}: {err}"))
}

/// Copy a directory tree, returning the number of files copied.
async fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
    let mut copied = 0;
    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((dir, target)) = stack.pop() {
        fs::create_dir_all(&target).await?;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let kind = entry.file_type().await?;
            if kind.is_dir() {
                stack.push((entry.path(), target.join(entry.file_name())));
            } else {
                fs::copy(entry.path(), target.join(entry.file_name())).await?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

#[async_trait]
impl Storage for FsStorage {
    async fn is_accessible(&self) -> bool {
        fs::try_exists(&self.root).await.unwrap_or(false)
    }

    async fn init_job(&self, job_id: &JobId) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await.map_err(|e| remote("create storage root", &e))?;
        match fs::create_dir(self.job_dir(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StorageError::NameConflict(job_id.to_string()))
            }
            Err(e) => Err(remote("create job namespace", &e)),
        }
    }

    async fn job_dir_exists(&self, job_id: &JobId) -> Result<bool, StorageError> {
        fs::try_exists(self.job_dir(job_id)).await.map_err(|e| remote("stat job namespace", &e))
    }

    async fn pull_job_data(&self, job_id: &JobId, local_dir: &Path) -> Result<(), StorageError> {
        let job_dir = self.require_job_dir(job_id).await?;
        let inputs = job_dir.join(INPUT_DIR);
        let target = local_dir.join(INPUT_DIR);

        let pulled = if fs::try_exists(&inputs).await.map_err(|e| remote("stat inputs", &e))? {
            copy_tree(&inputs, &target).await.map_err(|e| remote("pull job data", &e))?
        } else {
            fs::create_dir_all(&target).await.map_err(|e| remote("pull job data", &e))?;
            0
        };
        if pulled == 0 {
            warn!(
                job = %job_id,
                "no input objects pulled; make sure they are in the `inputs/` folder"
            );
        }
        Ok(())
    }

    async fn push_job_data(&self, job_id: &JobId, local_dir: &Path) -> Result<(), StorageError> {
        let job_dir = self.require_job_dir(job_id).await?;
        let outputs = local_dir.join(OUTPUT_DIR);

        let pushed = if fs::try_exists(&outputs).await.map_err(|e| remote("stat outputs", &e))? {
            copy_tree(&outputs, &job_dir.join(OUTPUT_DIR))
                .await
                .map_err(|e| remote("push job data", &e))?
        } else {
            0
        };
        if pushed == 0 {
            warn!(
                job = %job_id,
                "no output files pushed; make sure they are in the `outputs/` folder"
            );
        }
        Ok(())
    }

    async fn put_file(
        &self,
        job_id: &JobId,
        path: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let target = self.object_path(job_id, path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| remote("create object folder", &e))?;
        }
        fs::write(&target, data).await.map_err(|e| remote("put file", &e))
    }

    async fn get_file(
        &self,
        job_id: &JobId,
        path: &str,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.object_path(job_id, path)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(remote("get file", &e)),
        }
    }

    async fn set_job_status(
        &self,
        job_id: &JobId,
        status: &JobStatus,
    ) -> Result<(), StorageError> {
        let job_dir = self.job_dir(job_id);
        fs::create_dir_all(&job_dir).await.map_err(|e| remote("create job namespace", &e))?;
        let bytes = serde_json::to_vec_pretty(status)?;

        // Write-then-rename keeps readers from ever seeing a partial record.
        let tmp = job_dir.join(format!("{JOB_STATUS_FILE}.tmp"));
        fs::write(&tmp, &bytes).await.map_err(|e| remote("write status", &e))?;
        fs::rename(&tmp, job_dir.join(JOB_STATUS_FILE))
            .await
            .map_err(|e| remote("commit status", &e))
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<Option<JobStatus>, StorageError> {
        match fs::read(self.job_dir(job_id).join(JOB_STATUS_FILE)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(remote("read status", &e)),
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
