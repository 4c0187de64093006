// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sheep: one worker unit and its lifecycle.
//!
//! Each backend implements the small [`Sheep`] capability set; the shared
//! lifecycle (connect, disconnect, model tracking) lives in [`SheepHandle`],
//! so the engine never branches on the worker flavor.

mod bare;
mod container;
mod dummy;

pub use bare::BareSheep;
pub use container::ContainerSheep;
pub use dummy::DummySheep;

use crate::error::SheepError;
use async_trait::async_trait;
use shepherd_comm::{Channel, ChannelReader, ChannelWriter, Identity, Message};
use shepherd_core::{ModelRef, SheepId};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long a freshly launched worker gets to open its port.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Capability set every worker backend provides.
#[async_trait]
pub trait Sheep: Send {
    /// Prepare the requested model without touching the worker process.
    ///
    /// Idempotent; may block on an image pull or a filesystem check. Fails
    /// with [`SheepError::Configuration`] when the model cannot be served.
    async fn load_model(&mut self, model: &ModelRef) -> Result<(), SheepError>;

    /// Start the worker process for the previously loaded model.
    async fn launch(&mut self) -> Result<(), SheepError>;

    /// Terminate the worker process. Safe to call when not running.
    async fn kill(&mut self);

    /// Probe whether the worker process is alive.
    async fn running(&mut self) -> Result<bool, SheepError>;

    /// Port the worker's router endpoint listens on. Only meaningful after
    /// [`launch`](Sheep::launch).
    fn port(&self) -> u16;
}

/// One sheep as the engine sees it: a backend plus the shared lifecycle.
pub struct SheepHandle {
    id: SheepId,
    backend: Box<dyn Sheep>,
    data_root: PathBuf,
    current_model: Option<ModelRef>,
    writer: Option<ChannelWriter>,
}

impl SheepHandle {
    pub fn new(id: SheepId, backend: Box<dyn Sheep>, data_root: PathBuf) -> Self {
        Self { id, backend, data_root, current_model: None, writer: None }
    }

    pub fn id(&self) -> &SheepId {
        &self.id
    }

    /// Per-sheep scratch root, visible to the worker under the same path.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Model the sheep is currently configured to run.
    pub fn current_model(&self) -> Option<&ModelRef> {
        self.current_model.as_ref()
    }

    /// (Re)start the sheep for the given model.
    ///
    /// Slaughters any running worker, loads the model, launches the new
    /// worker and connects its channel. Returns the read half for the
    /// caller to register with the reply poller.
    pub async fn start(&mut self, model: &ModelRef) -> Result<ChannelReader, SheepError> {
        info!(sheep = %self.id, model = %model, "starting sheep");
        self.slaughter().await;
        self.backend.load_model(model).await?;
        self.current_model = Some(model.clone());
        self.backend.launch().await?;

        let port = self.backend.port();
        let channel = match connect_with_retry(port, &self.id).await {
            Ok(channel) => channel,
            Err(err) => {
                self.backend.kill().await;
                return Err(err);
            }
        };
        let (reader, writer) = channel.split();
        self.writer = Some(writer);
        Ok(reader)
    }

    /// Kill the worker process and drop the channel. Safe when not running.
    pub async fn slaughter(&mut self) {
        if self.writer.take().is_some() {
            debug!(sheep = %self.id, "disconnected sheep channel");
        }
        self.backend.kill().await;
    }

    /// Probe worker liveness; false whenever the channel is down.
    pub async fn running(&mut self) -> Result<bool, SheepError> {
        if self.writer.is_none() {
            return Ok(false);
        }
        self.backend.running().await
    }

    /// Send one message to the worker.
    pub async fn send(&mut self, message: &Message) -> Result<(), SheepError> {
        match &mut self.writer {
            Some(writer) => writer
                .send(message, None)
                .await
                .map_err(|e| SheepError::Runtime(format!("failed to send message: {e}"))),
            None => Err(SheepError::Runtime("sheep channel is not connected".into())),
        }
    }
}

/// Connect to a worker that may still be binding its port.
async fn connect_with_retry(port: u16, id: &SheepId) -> Result<Channel, SheepError> {
    let deadline = Instant::now() + CONNECT_TIMEOUT;
    loop {
        match Channel::connect(("127.0.0.1", port), Identity::from(id.as_str())).await {
            Ok(channel) => return Ok(channel),
            Err(err) if Instant::now() >= deadline => {
                return Err(SheepError::Connect { port, reason: err.to_string() });
            }
            Err(err) => {
                warn!(sheep = %id, port, error = %err, "runner port not ready, retrying");
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
}
