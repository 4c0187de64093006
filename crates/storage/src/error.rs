// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy of the storage interface.

use thiserror::Error;

/// Errors raised by [`crate::Storage`] implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote storage is not reachable at all. Transient; callers retry
    /// or surface it as a service-unavailable condition.
    #[error("remote storage is not accessible")]
    Inaccessible(#[source] Option<std::io::Error>),

    /// A job namespace with this id already exists.
    #[error("job namespace `{0}` already exists")]
    NameConflict(String),

    /// The remote storage rejected the operation.
    #[error("storage operation failed: {0}")]
    Remote(String),

    /// The remote storage returned data that could not be parsed.
    #[error("malformed data in storage: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StorageError {
    /// Shorthand for an inaccessible-storage error without a cause.
    pub fn inaccessible() -> Self {
        StorageError::Inaccessible(None)
    }
}
