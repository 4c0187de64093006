// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message types exchanged with sheep runners.

use serde::{Deserialize, Serialize};
use shepherd_core::JobId;
use std::path::PathBuf;

/// Routing identity of a peer connection.
///
/// Only meaningful on router-side reads, where it names the connection a
/// request arrived on; it never appears inside the serialized payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identity(pub Vec<u8>);

impl Identity {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// One protocol message, tagged in the payload so the encoding works on
/// transports that carry no type metadata of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum Message {
    /// Engine → runner: a job's inputs are staged and ready for processing.
    #[serde(rename = "InputMessage")]
    Input {
        job_id: JobId,
        /// Directory under which `<job_id>/inputs` and `<job_id>/outputs`
        /// are visible to both sides.
        io_data_root: PathBuf,
    },
    /// Runner → engine: inputs consumed, outputs written.
    #[serde(rename = "DoneMessage")]
    Done { job_id: JobId },
    /// Runner → engine: the job blew up.
    #[serde(rename = "ErrorMessage")]
    Error {
        job_id: JobId,
        /// Human-readable summary.
        short_error: String,
        /// Detail string, typically a stack trace.
        long_error: String,
    },
}

impl Message {
    /// The job this message is about.
    pub fn job_id(&self) -> &JobId {
        match self {
            Message::Input { job_id, .. }
            | Message::Done { job_id }
            | Message::Error { job_id, .. } => job_id,
        }
    }

    /// Tag-only kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Input { .. } => MessageKind::Input,
            Message::Done { .. } => MessageKind::Done,
            Message::Error { .. } => MessageKind::Error,
        }
    }
}

/// Tag-only variant of [`Message`] for expected-kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Input,
    Done,
    Error,
}

shepherd_core::simple_display! {
    MessageKind {
        Input => "InputMessage",
        Done => "DoneMessage",
        Error => "ErrorMessage",
    }
}

/// A received message together with the identity it arrived under.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: Message,
    pub identity: Identity,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
