// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener: drain worker replies, upload results, settle job statuses.

use super::{Polled, Shepherd};
use crate::workdir::{job_workdir, remove_workdir};
use shepherd_comm::{Envelope, Message, MessageKind};
use shepherd_core::{Clock, ErrorDetails, SheepId};
use shepherd_storage::Storage;
use std::sync::Arc;
use tracing::{info, warn};

impl<S: Storage, C: Clock + 'static> Shepherd<S, C> {
    /// Process replies multiplexed from every sheep channel, forever.
    pub(crate) async fn listen_loop(self: Arc<Self>) {
        let Some(mut replies) = self.poll_rx.lock().take() else {
            warn!("listener queue already taken, not listening");
            return;
        };
        while let Some(Polled { sheep_id, envelope }) = replies.recv().await {
            self.handle_reply(&sheep_id, envelope).await;
        }
    }

    async fn handle_reply(&self, sheep_id: &SheepId, envelope: Envelope) {
        let message = envelope.message;
        if !matches!(message.kind(), MessageKind::Done | MessageKind::Error) {
            warn!(
                sheep = %sheep_id,
                kind = %message.kind(),
                "unexpected message type from sheep, dropping frame"
            );
            return;
        }
        let job_id = message.job_id().clone();
        let Ok(slot) = self.slot(sheep_id) else { return };

        // Claim the job by removing it from the in-flight set. A reply for
        // a job that is no longer in flight lost the race against the
        // watchdog: its scratch directory and status are settled already.
        if !slot.in_flight.lock().remove(&job_id) {
            warn!(job = %job_id, sheep = %sheep_id, "late reply for a settled job, dropping");
            return;
        }

        let workdir = job_workdir(&slot.data_root, &job_id);
        if let Err(err) = self.storage.push_job_data(&job_id, &workdir).await {
            let details = self.failure_details("failed to upload job results", &err);
            self.fail_job(&job_id, details, Some(&workdir)).await;
            return;
        }
        remove_workdir(&workdir);

        match message {
            Message::Done { .. } => {
                info!(job = %job_id, sheep = %sheep_id, "job done");
                self.complete_job(&job_id).await;
            }
            Message::Error { short_error, long_error, .. } => {
                info!(job = %job_id, sheep = %sheep_id, error = %short_error, "job failed in sheep");
                let details = ErrorDetails {
                    message: short_error,
                    exception_type: None,
                    exception_traceback: self.debug.then_some(long_error),
                };
                self.fail_job(&job_id, details, None).await;
            }
            Message::Input { .. } => {}
        }
    }
}
