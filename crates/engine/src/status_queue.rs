// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized writer of job status records.
//!
//! All status writes go through this queue so that feeder- and
//! listener-generated updates for the same job never interleave on storage,
//! and so the hot path never waits on storage latency. Each submission
//! returns a handle that resolves when that particular write completed.

use parking_lot::Mutex;
use shepherd_core::{JobId, JobStatus};
use shepherd_storage::{Storage, StorageError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

struct StatusWrite {
    job_id: JobId,
    status: JobStatus,
    done: oneshot::Sender<Result<(), StorageError>>,
}

/// Completion handle of one submitted status write.
#[derive(Debug)]
pub struct StatusWriteHandle {
    rx: oneshot::Receiver<Result<(), StorageError>>,
}

impl StatusWriteHandle {
    /// Wait until the write reached storage (or failed).
    pub async fn written(self) -> Result<(), StorageError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Remote(
                "status write was dropped before completion".into(),
            )),
        }
    }
}

/// Queue of pending status writes with a small worker pool draining it.
///
/// With the default single worker, writes are applied strictly in submission
/// order; more workers trade that ordering for throughput.
pub struct StatusQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<StatusWrite>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl StatusQueue {
    /// Spawn the worker tasks and return the queue.
    pub fn spawn<S: Storage>(storage: Arc<S>, worker_count: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<StatusWrite>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let storage = storage.clone();
                let rx = rx.clone();
                tokio::spawn(async move {
                    loop {
                        let write = { rx.lock().await.recv().await };
                        let Some(write) = write else { break };
                        let result =
                            storage.set_job_status(&write.job_id, &write.status).await;
                        if let Err(err) = &result {
                            error!(
                                job = %write.job_id,
                                error = %err,
                                "failed to write job status"
                            );
                        } else {
                            debug!(
                                job = %write.job_id,
                                status = %write.status.state,
                                "job status written"
                            );
                        }
                        // receiver gone means the caller did not care
                        let _ = write.done.send(result);
                    }
                })
            })
            .collect();

        Self { tx: Mutex::new(Some(tx)), workers: Mutex::new(workers) }
    }

    /// Enqueue one status write.
    ///
    /// Never blocks; after [`close`](Self::close) the returned handle
    /// resolves with an error immediately.
    pub fn submit(&self, job_id: JobId, status: JobStatus) -> StatusWriteHandle {
        let (done, rx) = oneshot::channel();
        let accepted = match &*self.tx.lock() {
            Some(tx) => tx.send(StatusWrite { job_id, status, done }).is_ok(),
            None => false,
        };
        if !accepted {
            let (done, rx) = oneshot::channel();
            let _ = done.send(Err(StorageError::Remote(
                "status queue is closed".into(),
            )));
            return StatusWriteHandle { rx };
        }
        StatusWriteHandle { rx }
    }

    /// Stop intake, drain every accepted write and join the workers.
    pub async fn close(&self) {
        self.tx.lock().take();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in workers {
            if let Err(err) = worker.await {
                if !err.is_cancelled() {
                    error!(error = %err, "status queue worker panicked");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "status_queue_tests.rs"]
mod tests;
