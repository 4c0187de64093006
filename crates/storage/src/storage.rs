// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The storage interface consumed by the engine.

use crate::error::StorageError;
use async_trait::async_trait;
use shepherd_core::{JobId, JobStatus};
use std::path::Path;

/// Access to job data in a remote store.
///
/// Every job owns a namespace (bucket or directory) holding `inputs/...`,
/// `outputs/...` and `job_status.json`; paths inside a namespace use `/` as
/// the folder delimiter regardless of platform.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Check if the remote storage can be accessed at all.
    async fn is_accessible(&self) -> bool;

    /// Create the namespace for a new job.
    ///
    /// Fails with [`StorageError::NameConflict`] when it already exists.
    async fn init_job(&self, job_id: &JobId) -> Result<(), StorageError>;

    /// Check if a namespace exists for the given job.
    async fn job_dir_exists(&self, job_id: &JobId) -> Result<bool, StorageError>;

    /// Download the job's `inputs/` subtree into `<local_dir>/inputs/`,
    /// preserving relative paths.
    async fn pull_job_data(&self, job_id: &JobId, local_dir: &Path) -> Result<(), StorageError>;

    /// Upload `<local_dir>/outputs/` into the job's namespace, preserving
    /// relative paths.
    async fn push_job_data(&self, job_id: &JobId, local_dir: &Path) -> Result<(), StorageError>;

    /// Store a single file under the given `/`-delimited path.
    async fn put_file(
        &self,
        job_id: &JobId,
        path: &str,
        data: &[u8],
    ) -> Result<(), StorageError>;

    /// Fetch a single file; `None` when it does not exist.
    async fn get_file(&self, job_id: &JobId, path: &str)
        -> Result<Option<Vec<u8>>, StorageError>;

    /// Write the job's status record.
    async fn set_job_status(
        &self,
        job_id: &JobId,
        status: &JobStatus,
    ) -> Result<(), StorageError>;

    /// Read the job's status record; `None` when none was ever written.
    async fn get_job_status(&self, job_id: &JobId) -> Result<Option<JobStatus>, StorageError>;
}
