// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdogs: per-sheep liveness checks and the engine health probe.

use super::Shepherd;
use crate::registry::list_registry_images;
use crate::workdir::job_workdir;
use shepherd_core::{Clock, ErrorDetails, JobId, SheepId};
use shepherd_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Cadence of both the sheep watchdog and the engine health probe.
const PROBE_INTERVAL: Duration = Duration::from_secs(1);

impl<S: Storage, C: Clock + 'static> Shepherd<S, C> {
    /// Periodically check that the sheep's worker is alive; a silent death
    /// fails every in-flight job within one tick.
    pub(crate) async fn watchdog_loop(self: Arc<Self>, sheep_id: SheepId) {
        let Ok(slot) = self.slot(&sheep_id) else { return };
        let mut ticker = tokio::time::interval(PROBE_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let running = match slot.handle.lock().await.running().await {
                Ok(running) => running,
                Err(err) => {
                    warn!(sheep = %sheep_id, error = %err, "failed to check sheep health");
                    continue;
                }
            };
            if running {
                continue;
            }

            let stranded: Vec<JobId> = {
                let mut in_flight = slot.in_flight.lock();
                in_flight.drain().collect()
            };
            for job_id in stranded {
                error!(job = %job_id, sheep = %sheep_id, "sheep worker died without notice");
                let workdir = job_workdir(&slot.data_root, &job_id);
                self.fail_job(
                    &job_id,
                    ErrorDetails::message("Sheep worker died without notice"),
                    Some(&workdir),
                )
                .await;
            }
        }
    }

    /// Surface storage and registry reachability transitions to the
    /// operator. Never fails jobs by itself.
    pub(crate) async fn health_loop(self: Arc<Self>) {
        let client = self.registry.as_ref().map(|_| reqwest::Client::new());
        let mut storage_down = false;
        let mut registry_down = false;

        let mut ticker = tokio::time::interval(PROBE_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            let accessible = self.storage.is_accessible().await;
            if !accessible && !storage_down {
                error!("the remote storage is not accessible");
                storage_down = true;
            } else if accessible && storage_down {
                info!("the remote storage is accessible again");
                storage_down = false;
            }

            if let (Some(registry), Some(client)) = (&self.registry, &client) {
                match list_registry_images(client, registry).await {
                    Ok(_) => {
                        if registry_down {
                            info!("the registry is accessible again");
                            registry_down = false;
                        }
                    }
                    Err(err) => {
                        if !registry_down {
                            error!(error = %err, "the registry is not accessible");
                            registry_down = true;
                        }
                    }
                }
            }
        }
    }
}
