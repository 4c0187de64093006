// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shepherd engine: creation and access to a configured flock of sheep.
//!
//! Four cooperative task families run under one engine: a feeder and a
//! watchdog per sheep, a global listener draining worker replies, and a
//! global health probe. The in-flight set of each sheep is the
//! synchronization anchor: the feeder adds to it, the listener and the
//! watchdog claim from it, and exactly one of them writes a job's terminal
//! status.

mod feed;
mod listen;
mod monitor;

use crate::config::{RegistryConfig, SheepConfig, ShepherdConfig};
use crate::error::{SheepError, ShepherdError};
use crate::notifier::JobDoneNotifier;
use crate::sheep::{BareSheep, ContainerSheep, DummySheep, Sheep, SheepHandle};
use crate::status_queue::{StatusQueue, StatusWriteHandle};
use crate::workdir::create_clean_dir;
use indexmap::IndexMap;
use parking_lot::Mutex;
use shepherd_comm::{ChannelReader, Envelope, Messenger};
use shepherd_core::{Clock, ErrorDetails, JobId, JobStatus, ModelRef, SheepId};
use shepherd_storage::Storage;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Snapshot of one sheep for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct SheepStatus {
    pub running: bool,
    pub model: Option<ModelRef>,
    /// One of the jobs currently sent to the worker, if any.
    pub current_request: Option<JobId>,
    /// Depth of the pending queue; the operator's backpressure signal.
    pub pending: usize,
}

/// Engine-side bookkeeping around one sheep.
pub(crate) struct SheepSlot {
    pub(crate) id: SheepId,
    pub(crate) handle: tokio::sync::Mutex<SheepHandle>,
    pub(crate) queue_tx: mpsc::UnboundedSender<JobId>,
    pub(crate) queue_rx: Mutex<Option<mpsc::UnboundedReceiver<JobId>>>,
    pub(crate) in_flight: Mutex<HashSet<JobId>>,
    pub(crate) pending: AtomicUsize,
    pub(crate) data_root: PathBuf,
}

/// A decoded worker reply tagged with the sheep it came from.
pub(crate) struct Polled {
    pub(crate) sheep_id: SheepId,
    pub(crate) envelope: Envelope,
}

/// Manages creation and access to a configured set of sheep.
pub struct Shepherd<S: Storage, C: Clock> {
    pub(crate) storage: Arc<S>,
    pub(crate) clock: C,
    pub(crate) registry: Option<RegistryConfig>,
    pub(crate) debug: bool,
    pub(crate) sheep: IndexMap<SheepId, SheepSlot>,
    /// In-memory record of every job between `enqueue_job` and its terminal
    /// status write; finished jobs live in storage only.
    pub(crate) jobs: Mutex<HashMap<JobId, JobStatus>>,
    pub(crate) notifier: JobDoneNotifier,
    pub(crate) status_queue: StatusQueue,
    pub(crate) poll_tx: mpsc::UnboundedSender<Polled>,
    pub(crate) poll_rx: Mutex<Option<mpsc::UnboundedReceiver<Polled>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    closed: AtomicBool,
}

impl<S: Storage, C: Clock + 'static> Shepherd<S, C> {
    /// Create the engine: one slot and one clean data directory per
    /// configured sheep. No background activity starts until
    /// [`start`](Self::start).
    pub fn new(config: &ShepherdConfig, storage: Arc<S>, clock: C) -> Result<Self, ShepherdError> {
        config.validate()?;

        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        let status_queue = StatusQueue::spawn(storage.clone(), config.status_workers);

        let mut sheep = IndexMap::new();
        for (id_raw, sheep_config) in &config.sheep {
            let id = SheepId::new(id_raw);
            let data_root = create_clean_dir(&config.data_root.join(id_raw))?;
            let backend = build_backend(sheep_config, config.registry.as_ref(), &data_root)?;

            let (queue_tx, queue_rx) = mpsc::unbounded_channel();
            info!(sheep = %id, kind = sheep_config.kind(), "created sheep");
            sheep.insert(
                id.clone(),
                SheepSlot {
                    handle: tokio::sync::Mutex::new(SheepHandle::new(
                        id.clone(),
                        backend,
                        data_root.clone(),
                    )),
                    id,
                    queue_tx,
                    queue_rx: Mutex::new(Some(queue_rx)),
                    in_flight: Mutex::new(HashSet::new()),
                    pending: AtomicUsize::new(0),
                    data_root,
                },
            );
        }

        Ok(Self {
            storage,
            clock,
            registry: config.registry.clone(),
            debug: config.debug,
            sheep,
            jobs: Mutex::new(HashMap::new()),
            notifier: JobDoneNotifier::new(),
            status_queue,
            poll_tx,
            poll_rx: Mutex::new(Some(poll_rx)),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    /// Spawn the long-lived engine tasks: one feeder and one watchdog per
    /// sheep, the global listener and the global health probe.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("engine tasks already started");
            return;
        }
        let mut tasks = self.tasks.lock();
        for sheep_id in self.sheep.keys().cloned() {
            tasks.push(tokio::spawn(self.clone().feed_loop(sheep_id.clone())));
            tasks.push(tokio::spawn(self.clone().watchdog_loop(sheep_id)));
        }
        tasks.push(tokio::spawn(self.clone().listen_loop()));
        tasks.push(tokio::spawn(self.clone().health_loop()));
        info!(sheep = self.sheep.len(), "engine started");
    }

    pub(crate) fn slot(&self, sheep_id: &SheepId) -> Result<&SheepSlot, ShepherdError> {
        self.sheep.get(sheep_id).ok_or_else(|| ShepherdError::UnknownSheep(sheep_id.clone()))
    }

    /// (Re)start the sheep with the given id for the specified model.
    pub async fn start_sheep(
        self: &Arc<Self>,
        sheep_id: &SheepId,
        model: &ModelRef,
    ) -> Result<(), ShepherdError> {
        let slot = self.slot(sheep_id)?;
        let reader = slot.handle.lock().await.start(model).await?;
        slot.in_flight.lock().clear();
        self.register_reader(sheep_id, reader);
        Ok(())
    }

    /// Slaughter (kill) the specified sheep: its worker process is
    /// terminated and its channel torn down.
    pub async fn slaughter_sheep(&self, sheep_id: &SheepId) -> Result<(), ShepherdError> {
        info!(sheep = %sheep_id, "slaughtering sheep");
        self.slot(sheep_id)?.handle.lock().await.slaughter().await;
        Ok(())
    }

    /// Queue the given job for execution; the first configured sheep is used
    /// unless one is named.
    ///
    /// Returns the completion handle of the `queued` status write; callers
    /// that need durability await it, everyone else drops it.
    pub fn enqueue_job(
        &self,
        job_id: JobId,
        model: ModelRef,
        sheep_id: Option<&SheepId>,
    ) -> Result<StatusWriteHandle, ShepherdError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ShepherdError::Closed);
        }
        let slot = match sheep_id {
            Some(id) => self.slot(id)?,
            None => {
                let slot = self
                    .sheep
                    .values()
                    .next()
                    .ok_or_else(|| ShepherdError::Config("no sheep configured".into()))?;
                info!(job = %job_id, sheep = %slot.id, "job auto-assigned to first sheep");
                slot
            }
        };

        let status = JobStatus::queued(model, self.clock.timestamp());
        self.jobs.lock().insert(job_id.clone(), status.clone());
        let handle = self.status_queue.submit(job_id.clone(), status);

        slot.pending.fetch_add(1, Ordering::SeqCst);
        if slot.queue_tx.send(job_id.clone()).is_err() {
            // feeder gone; the engine is shutting down
            slot.pending.fetch_sub(1, Ordering::SeqCst);
            self.jobs.lock().remove(&job_id);
            return Err(ShepherdError::Closed);
        }
        info!(job = %job_id, sheep = %slot.id, "job enqueued");
        Ok(handle)
    }

    /// Check if the specified job is already done (finished or failed).
    ///
    /// A job with a terminal status in storage is done; a job this engine
    /// still tracks in memory is not done yet; anything else is unknown.
    pub async fn is_job_done(&self, job_id: &JobId) -> Result<bool, ShepherdError> {
        if let Some(status) = self.storage.get_job_status(job_id).await? {
            return Ok(status.is_terminal());
        }
        // the queued write may still be in the status queue
        if self.jobs.lock().contains_key(job_id) {
            return Ok(false);
        }
        Err(ShepherdError::UnknownJob(job_id.clone()))
    }

    /// Current status of a job: the in-memory record when the job is still
    /// in the engine, the stored record otherwise.
    pub async fn job_status(&self, job_id: &JobId) -> Result<JobStatus, ShepherdError> {
        if let Some(status) = self.jobs.lock().get(job_id).cloned() {
            return Ok(status);
        }
        match self.storage.get_job_status(job_id).await? {
            Some(status) => Ok(status),
            None => Err(ShepherdError::UnknownJob(job_id.clone())),
        }
    }

    /// Block until the given job reaches a terminal status.
    ///
    /// Fails with [`ShepherdError::UnknownJob`] for jobs this engine never
    /// saw and with [`ShepherdError::Closed`] when the engine shuts down
    /// while waiting.
    pub async fn wait_job_done(&self, job_id: &JobId) -> Result<(), ShepherdError> {
        loop {
            let notified = self.notifier.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_job_done(job_id).await? {
                return Ok(());
            }
            if self.notifier.is_closed() {
                return Err(ShepherdError::Closed);
            }
            notified.await;
        }
    }

    /// Status snapshot of every sheep, in configuration order.
    pub async fn get_status(&self) -> Vec<(SheepId, SheepStatus)> {
        let mut out = Vec::with_capacity(self.sheep.len());
        for (id, slot) in &self.sheep {
            let (running, model) = {
                let mut handle = slot.handle.lock().await;
                let running = handle.running().await.unwrap_or(false);
                (running, handle.current_model().cloned())
            };
            let current_request = slot.in_flight.lock().iter().next().cloned();
            out.push((
                id.clone(),
                SheepStatus {
                    running,
                    model,
                    current_request,
                    pending: slot.pending.load(Ordering::SeqCst),
                },
            ));
        }
        out
    }

    /// The broadcast primitive signaled on every finished job.
    pub fn notifier(&self) -> &JobDoneNotifier {
        &self.notifier
    }

    /// Shut the engine down: cancel all tasks, slaughter all sheep and
    /// drain the status-update queue. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("closing the engine");
        self.notifier.close();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        for sheep_id in self.sheep.keys() {
            if let Err(err) = self.slaughter_sheep(sheep_id).await {
                warn!(sheep = %sheep_id, error = %err, "failed to slaughter sheep on close");
            }
        }
        self.status_queue.close().await;
    }

    /// Forward decoded replies from a freshly connected sheep channel into
    /// the listener's queue until the connection dies.
    pub(crate) fn register_reader(self: &Arc<Self>, sheep_id: &SheepId, mut reader: ChannelReader) {
        let tx = self.poll_tx.clone();
        let id = sheep_id.clone();
        let task = tokio::spawn(async move {
            loop {
                match Messenger::recv(&mut reader, &[]).await {
                    Ok(envelope) => {
                        if tx.send(Polled { sheep_id: id.clone(), envelope }).is_err() {
                            break;
                        }
                    }
                    Err(shepherd_comm::MessageError::Closed) => {
                        debug!(sheep = %id, "sheep channel closed");
                        break;
                    }
                    Err(err) => {
                        warn!(sheep = %id, error = %err, "failed to read from sheep channel");
                        break;
                    }
                }
            }
        });
        self.tasks.lock().push(task);
    }

    /// Build failure details; exception type and trace only in debug mode.
    pub(crate) fn failure_details<E: std::error::Error>(
        &self,
        context: &str,
        err: &E,
    ) -> ErrorDetails {
        let mut details = ErrorDetails::message(format!("{context} ({err})"));
        if self.debug {
            details.exception_type = Some(std::any::type_name::<E>().to_string());
            let mut chain = vec![err.to_string()];
            let mut source = err.source();
            while let Some(cause) = source {
                chain.push(cause.to_string());
                source = cause.source();
            }
            details.exception_traceback = Some(chain.join("\ncaused by: "));
        }
        details
    }

    /// Write the terminal `failed` status for a job and drop its in-memory
    /// record. The scratch directory, when given, is removed first.
    pub(crate) async fn fail_job(
        &self,
        job_id: &JobId,
        details: ErrorDetails,
        workdir: Option<&std::path::Path>,
    ) {
        tracing::error!(job = %job_id, error = %details.message, "job failed");
        if let Some(dir) = workdir {
            crate::workdir::remove_workdir(dir);
        }
        let status = {
            let mut jobs = self.jobs.lock();
            let Some(record) = jobs.get_mut(job_id) else {
                warn!(job = %job_id, "failed job is not tracked in memory, skipping status");
                return;
            };
            if record.finish_failed(self.clock.timestamp(), details).is_err() {
                warn!(job = %job_id, "job already terminal, keeping the first status");
                return;
            }
            record.clone()
        };
        self.finish_status_write(job_id, status).await;
    }

    /// Write the terminal `done` status for a job and drop its in-memory
    /// record.
    pub(crate) async fn complete_job(&self, job_id: &JobId) {
        let status = {
            let mut jobs = self.jobs.lock();
            let Some(record) = jobs.get_mut(job_id) else {
                warn!(job = %job_id, "done job is not tracked in memory, skipping status");
                return;
            };
            if record.finish_done(self.clock.timestamp()).is_err() {
                warn!(job = %job_id, "job already terminal, keeping the first status");
                return;
            }
            record.clone()
        };
        self.finish_status_write(job_id, status).await;
    }

    /// Persist a terminal status, then retire the in-memory record and
    /// broadcast. On a failed write the record stays so the job is still
    /// reported as not-done rather than unknown.
    async fn finish_status_write(&self, job_id: &JobId, status: JobStatus) {
        debug_assert!(status.is_terminal());
        let state = status.state;
        let write = self.status_queue.submit(job_id.clone(), status);
        match write.written().await {
            Ok(()) => {
                self.jobs.lock().remove(job_id);
            }
            Err(err) => {
                tracing::error!(
                    job = %job_id,
                    status = %state,
                    error = %err,
                    "failed to persist terminal status"
                );
            }
        }
        self.notifier.notify();
    }
}

/// Instantiate the backend for one configured sheep.
fn build_backend(
    config: &SheepConfig,
    registry: Option<&RegistryConfig>,
    data_root: &std::path::Path,
) -> Result<Box<dyn Sheep>, ShepherdError> {
    match config {
        SheepConfig::Bare(bare) => Ok(Box::new(BareSheep::new(bare.clone()))),
        SheepConfig::Container(container) => {
            let registry = registry.ok_or_else(|| {
                SheepError::Configuration(
                    "to use container sheep, configure a registry URL".into(),
                )
            })?;
            Ok(Box::new(ContainerSheep::new(
                container.clone(),
                registry.clone(),
                data_root.to_path_buf(),
            )))
        }
        SheepConfig::Dummy(dummy) => Ok(Box::new(DummySheep::new(dummy.clone()))),
    }
}

#[cfg(test)]
#[path = "shepherd_tests.rs"]
mod tests;
