// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container sheep: a runner in an isolated container.
//!
//! GPU computation uses the nvidia runtime when GPU devices are configured;
//! the sheep data root is bind-mounted at the same path inside and outside
//! so `io_data_root` means the same thing to both sides.

use super::bare::visible_gpu_list;
use super::Sheep;
use crate::config::{ContainerSheepConfig, RegistryConfig};
use crate::docker::{DockerContainer, DockerImage};
use crate::error::SheepError;
use async_trait::async_trait;
use shepherd_core::ModelRef;
use std::path::PathBuf;
use tracing::warn;

/// Port the runner binds inside the container.
const CONTAINER_PORT: u16 = 9999;

/// Worker running in a container pulled from the registry.
pub struct ContainerSheep {
    config: ContainerSheepConfig,
    registry: RegistryConfig,
    data_root: PathBuf,
    image: Option<DockerImage>,
    container: Option<DockerContainer>,
}

impl ContainerSheep {
    pub fn new(config: ContainerSheepConfig, registry: RegistryConfig, data_root: PathBuf) -> Self {
        Self { config, registry, data_root, image: None, container: None }
    }
}

#[async_trait]
impl Sheep for ContainerSheep {
    async fn load_model(&mut self, model: &ModelRef) -> Result<(), SheepError> {
        let image = DockerImage::new(&model.name, &model.version, self.registry.clone());
        image.pull().await.map_err(|err| {
            SheepError::Configuration(format!("model `{model}` cannot be loaded: {err}"))
        })?;
        self.image = Some(image);
        Ok(())
    }

    async fn launch(&mut self) -> Result<(), SheepError> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| SheepError::Configuration("no image loaded".into()))?;

        let model = image.full_name();
        let gpus = visible_gpu_list(&self.config.devices);
        let mut container = DockerContainer::new(image, self.config.autoremove)
            .port(self.config.port, CONTAINER_PORT)
            .bind_mount(self.data_root.clone(), self.data_root.clone());
        if !gpus.is_empty() {
            container = container.env("NVIDIA_VISIBLE_DEVICES", gpus).runtime("nvidia");
        }

        container.start().await.map_err(|err| {
            SheepError::Configuration(format!("image `{model}` cannot be started: {err}"))
        })?;
        self.container = Some(container);
        Ok(())
    }

    async fn kill(&mut self) {
        if let Some(mut container) = self.container.take() {
            if let Err(err) = container.kill().await {
                warn!(error = %err, "failed to kill sheep container");
            }
        }
    }

    async fn running(&mut self) -> Result<bool, SheepError> {
        match &self.container {
            None => Ok(false),
            Some(container) => container
                .running()
                .await
                .map_err(|e| SheepError::Runtime(format!("failed to inspect container: {e}"))),
        }
    }

    fn port(&self) -> u16 {
        self.config.port
    }
}
