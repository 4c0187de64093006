// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status record and its state machine.

use crate::model::ModelRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of a job as persisted in its status record.
///
/// A job moves `queued → processing → {done, failed}`; the extra
/// `queued → failed` edge covers configuration failures detected before any
/// input reaches a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobState {
    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Processing => "processing",
        Done => "done",
        Failed => "failed",
    }
}

/// Details of the error that failed a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_traceback: Option<String>,
}

impl ErrorDetails {
    /// Details carrying only the human-readable message.
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: message.into(), exception_type: None, exception_traceback: None }
    }
}

/// Attempted status transition that would leave the simple path.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid status transition from `{from}` to `{to}`")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

/// Status record of a job, serialized as JSON into `job_status.json` in the
/// job's storage namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "status")]
    pub state: JobState,
    pub model: ModelRef,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

impl JobStatus {
    /// Create a freshly accepted record in the `queued` state.
    pub fn queued(model: ModelRef, now: DateTime<Utc>) -> Self {
        Self {
            state: JobState::Queued,
            model,
            enqueued_at: now,
            processing_started_at: None,
            finished_at: None,
            error_details: None,
        }
    }

    /// Check if this record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Transition `queued → processing` and stamp the processing start.
    pub fn start_processing(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        if self.state != JobState::Queued {
            return Err(InvalidTransition { from: self.state, to: JobState::Processing });
        }
        self.state = JobState::Processing;
        self.processing_started_at = Some(now);
        Ok(())
    }

    /// Transition `processing → done` and stamp the finish time.
    pub fn finish_done(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        if self.state != JobState::Processing {
            return Err(InvalidTransition { from: self.state, to: JobState::Done });
        }
        self.state = JobState::Done;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Transition to `failed` from any non-terminal state.
    pub fn finish_failed(
        &mut self,
        now: DateTime<Utc>,
        details: ErrorDetails,
    ) -> Result<(), InvalidTransition> {
        if self.is_terminal() {
            return Err(InvalidTransition { from: self.state, to: JobState::Failed });
        }
        self.state = JobState::Failed;
        self.finished_at = Some(now);
        self.error_details = Some(details);
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
