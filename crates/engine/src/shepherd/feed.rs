// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feeder: de-queue jobs, stage their data and feed them to one sheep.

use super::Shepherd;
use crate::error::{SheepError, ShepherdError};
use crate::workdir::{create_clean_dir, job_workdir};
use shepherd_comm::Message;
use shepherd_core::constants::OUTPUT_DIR;
use shepherd_core::{Clock, ErrorDetails, JobId, SheepId};
use shepherd_storage::Storage;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

impl<S: Storage, C: Clock + 'static> Shepherd<S, C> {
    /// De-queue jobs, prepare working directories and send input messages
    /// to the sheep, forever. Failures are confined to the job at hand.
    pub(crate) async fn feed_loop(self: Arc<Self>, sheep_id: SheepId) {
        let Ok(slot) = self.slot(&sheep_id) else { return };
        let Some(mut queue) = slot.queue_rx.lock().take() else {
            warn!(sheep = %sheep_id, "feeder queue already taken, not feeding");
            return;
        };
        while let Some(job_id) = queue.recv().await {
            slot.pending.fetch_sub(1, Ordering::SeqCst);
            self.feed_one(&sheep_id, &job_id).await;
        }
    }

    /// Run one job through preparation, model reconciliation and dispatch.
    async fn feed_one(self: &Arc<Self>, sheep_id: &SheepId, job_id: &JobId) {
        let Ok(slot) = self.slot(sheep_id) else { return };
        let workdir = job_workdir(&slot.data_root, job_id);
        info!(job = %job_id, sheep = %sheep_id, "preparing working directory");

        // stage inputs into a clean scratch directory
        let staged: Result<(), ShepherdError> = async {
            create_clean_dir(&workdir)?;
            self.storage.pull_job_data(job_id, &workdir).await?;
            create_clean_dir(&workdir.join(OUTPUT_DIR))?;
            Ok(())
        }
        .await;
        if let Err(err) = staged {
            let details = self.failure_details("failed to prepare job data", &err);
            self.fail_job(job_id, details, Some(&workdir)).await;
            return;
        }

        // the job is now being worked on
        let Some(model) = self.mark_processing(job_id) else {
            warn!(job = %job_id, "job has no in-memory record, dropping");
            crate::workdir::remove_workdir(&workdir);
            return;
        };

        // reconcile the sheep with the model this job needs
        let needs_restart = {
            let mut handle = slot.handle.lock().await;
            let running = match handle.running().await {
                Ok(running) => running,
                Err(err) => {
                    warn!(sheep = %sheep_id, error = %err, "health probe failed, restarting");
                    false
                }
            };
            handle.current_model() != Some(&model) || !running
        };
        if needs_restart {
            info!(job = %job_id, sheep = %sheep_id, model = %model, "job requires model");
            // replies already in the socket must not be lost with the worker
            self.notifier.wait_for(|| slot.in_flight.lock().is_empty()).await;

            match self.start_sheep(sheep_id, &model).await {
                Ok(()) => {}
                Err(ShepherdError::Sheep(SheepError::Configuration(reason))) => {
                    let details = ErrorDetails::message(format!(
                        "failed to start sheep for this job ({reason})"
                    ));
                    self.fail_job(job_id, details, Some(&workdir)).await;
                    return;
                }
                Err(err) => {
                    let details =
                        self.failure_details("failed to start sheep for this job", &err);
                    self.fail_job(job_id, details, Some(&workdir)).await;
                    return;
                }
            }
        }

        // mark in flight, then hand the job to the worker
        slot.in_flight.lock().insert(job_id.clone());
        let input =
            Message::Input { job_id: job_id.clone(), io_data_root: slot.data_root.clone() };
        let sent = slot.handle.lock().await.send(&input).await;
        match sent {
            Ok(()) => info!(job = %job_id, sheep = %sheep_id, "input message sent"),
            Err(err) => {
                slot.in_flight.lock().remove(job_id);
                let details = self.failure_details("failed to send job to sheep", &err);
                self.fail_job(job_id, details, Some(&workdir)).await;
            }
        }
    }

    /// Advance the in-memory record to `processing` and enqueue the status
    /// write without waiting for it. Returns the model the job needs.
    fn mark_processing(&self, job_id: &JobId) -> Option<shepherd_core::ModelRef> {
        let status = {
            let mut jobs = self.jobs.lock();
            let record = jobs.get_mut(job_id)?;
            if let Err(err) = record.start_processing(self.clock.timestamp()) {
                warn!(job = %job_id, error = %err, "unexpected status transition");
            }
            record.clone()
        };
        let model = status.model.clone();
        let _ = self.status_queue.submit(job_id.clone(), status);
        Some(model)
    }
}
