// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dummy sheep: an in-process worker for tests and local smoke runs.
//!
//! Serves the doubling model: reads `inputs/input` as JSON
//! `{"key": [n, ...]}` and writes `outputs/output` as the same object with
//! an added `"output": [2n]`. Any model name loads successfully.

use super::Sheep;
use crate::config::DummySheepConfig;
use crate::error::SheepError;
use async_trait::async_trait;
use shepherd_comm::{Envelope, Message, MessageError, Messenger, RouterListener};
use shepherd_core::constants::{DEFAULT_OUTPUT_PATH, DEFAULT_PAYLOAD_PATH};
use shepherd_core::{JobId, ModelRef};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const BIND_RETRY_DELAY: Duration = Duration::from_millis(50);
const BIND_ATTEMPTS: usize = 40;

/// In-process worker serving the doubling model.
pub struct DummySheep {
    config: DummySheepConfig,
    bound_port: Option<u16>,
    alive: Arc<AtomicBool>,
    server: Option<JoinHandle<()>>,
}

impl DummySheep {
    pub fn new(config: DummySheepConfig) -> Self {
        Self { config, bound_port: None, alive: Arc::new(AtomicBool::new(false)), server: None }
    }
}

#[async_trait]
impl Sheep for DummySheep {
    async fn load_model(&mut self, _model: &ModelRef) -> Result<(), SheepError> {
        Ok(())
    }

    async fn launch(&mut self) -> Result<(), SheepError> {
        // a just-killed predecessor may still hold the port
        let mut attempt = 0;
        let listener = loop {
            match RouterListener::bind(("127.0.0.1", self.config.port)).await {
                Ok(listener) => break listener,
                Err(err) if attempt < BIND_ATTEMPTS => {
                    attempt += 1;
                    debug!(port = self.config.port, error = %err, "bind not ready, retrying");
                    tokio::time::sleep(BIND_RETRY_DELAY).await;
                }
                Err(err) => {
                    return Err(SheepError::Runtime(format!(
                        "cannot bind dummy worker on port {}: {err}",
                        self.config.port
                    )))
                }
            }
        };
        let addr = listener
            .local_addr()
            .map_err(|e| SheepError::Runtime(format!("cannot resolve bound port: {e}")))?;
        self.bound_port = Some(addr.port());

        let alive = Arc::new(AtomicBool::new(true));
        self.alive = alive.clone();
        info!(port = addr.port(), "dummy worker is listening");
        self.server = Some(tokio::spawn(serve(listener, alive)));
        Ok(())
    }

    async fn kill(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(server) = self.server.take() {
            server.abort();
        }
        self.bound_port = None;
    }

    async fn running(&mut self) -> Result<bool, SheepError> {
        Ok(self.alive.load(Ordering::SeqCst))
    }

    fn port(&self) -> u16 {
        self.bound_port.unwrap_or(self.config.port)
    }
}

async fn serve(listener: RouterListener, alive: Arc<AtomicBool>) {
    while alive.load(Ordering::SeqCst) {
        let channel = match listener.accept().await {
            Ok(channel) => channel,
            Err(err) => {
                warn!(error = %err, "dummy worker failed to accept a connection");
                break;
            }
        };
        let (mut reader, mut writer) = channel.split();
        loop {
            let envelope = match Messenger::recv(&mut reader, &[]).await {
                Ok(envelope) => envelope,
                Err(MessageError::Closed) => break,
                Err(err) => {
                    warn!(error = %err, "dummy worker failed to read a message");
                    break;
                }
            };
            let reply = handle_request(&envelope).await;
            if let Err(err) = Messenger::send(&mut writer, &reply, Some(&envelope)).await {
                warn!(error = %err, "dummy worker failed to reply");
                break;
            }
        }
    }
    alive.store(false, Ordering::SeqCst);
}

async fn handle_request(envelope: &Envelope) -> Message {
    match &envelope.message {
        Message::Input { job_id, io_data_root } => {
            debug!(job = %job_id, root = %io_data_root.display(), "dummy worker received job");
            match double_payload(io_data_root, job_id).await {
                Ok(()) => Message::Done { job_id: job_id.clone() },
                Err(short) => Message::Error {
                    job_id: job_id.clone(),
                    long_error: format!("job `{job_id}` in `{}`: {short}", io_data_root.display()),
                    short_error: short,
                },
            }
        }
        other => Message::Error {
            job_id: other.job_id().clone(),
            short_error: "unrecognized message type".into(),
            long_error: format!("{other:?}"),
        },
    }
}

async fn double_payload(io_data_root: &Path, job_id: &JobId) -> Result<(), String> {
    let job_dir = io_data_root.join(job_id.as_str());
    let input_path = job_dir.join(DEFAULT_PAYLOAD_PATH);

    let bytes = tokio::fs::read(&input_path)
        .await
        .map_err(|e| format!("cannot read `{}`: {e}", input_path.display()))?;
    let mut payload: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("input is not valid JSON: {e}"))?;

    let n = payload
        .get("key")
        .and_then(|k| k.get(0))
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| "input payload has no `key` number array".to_string())?;
    payload["output"] = serde_json::json!([n * 2]);

    let output_path = job_dir.join(DEFAULT_OUTPUT_PATH);
    let encoded =
        serde_json::to_vec(&payload).map_err(|e| format!("cannot encode output: {e}"))?;
    tokio::fs::write(&output_path, encoded)
        .await
        .map_err(|e| format!("cannot write `{}`: {e}", output_path.display()))
}
