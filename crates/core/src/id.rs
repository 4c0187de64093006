// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and sheep identifiers.

crate::string_id! {
    /// Unique identifier for a job.
    ///
    /// Chosen by the client when the job is submitted; doubles as the name
    /// of the job's namespace in remote storage.
    pub struct JobId;
}

crate::string_id! {
    /// Unique identifier for a sheep, stable for the engine's lifetime.
    ///
    /// Comes from the configuration file; the underlying worker process may
    /// be started and killed many times under the same id.
    pub struct SheepId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
