// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types of the engine.

use crate::docker::DockerError;
use shepherd_comm::MessageError;
use shepherd_core::{JobId, SheepId};
use shepherd_storage::StorageError;
use thiserror::Error;

/// Errors of a single sheep.
#[derive(Debug, Error)]
pub enum SheepError {
    /// The sheep cannot be started for the requested model (bad image, bad
    /// version, missing files, mismatched runtime). The job is failed; the
    /// sheep stays available for other models.
    #[error("sheep configuration error: {0}")]
    Configuration(String),

    /// Generic runtime problem with the sheep or its worker process.
    #[error("sheep runtime error: {0}")]
    Runtime(String),

    /// The runner never opened its port after launch.
    #[error("failed to connect to the runner on port {port}: {reason}")]
    Connect { port: u16, reason: String },
}

impl From<DockerError> for SheepError {
    fn from(err: DockerError) -> Self {
        SheepError::Runtime(err.to_string())
    }
}

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error)]
pub enum ShepherdError {
    #[error("unknown job id `{0}`")]
    UnknownJob(JobId),

    #[error("unknown sheep id `{0}`")]
    UnknownSheep(SheepId),

    #[error(transparent)]
    Sheep(#[from] SheepError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the engine is shutting down")]
    Closed,
}
