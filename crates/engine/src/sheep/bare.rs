// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bare sheep: a runner child process on the host.
//!
//! Useful where container isolation is impossible or unnecessary, e.g.
//! deployments with just a few models.

use super::Sheep;
use crate::config::BareSheepConfig;
use crate::error::SheepError;
use async_trait::async_trait;
use shepherd_core::ModelRef;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Name of the runner configuration file inside a model directory.
const RUNNER_CONFIG_FILE: &str = "config.yaml";

/// Extract the GPU number from a Linux device name.
///
/// `/dev/nvidia1` yields `1`; anything else (`/dev/sda2`, `/dev/nvidiactl`)
/// yields nothing.
pub(crate) fn extract_gpu_number(device_name: &str) -> Option<&str> {
    device_name
        .strip_prefix("/dev/nvidia")
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `CUDA_VISIBLE_DEVICES`-style list from configured device names.
pub(crate) fn visible_gpu_list(devices: &[String]) -> String {
    devices
        .iter()
        .filter_map(|d| extract_gpu_number(d))
        .collect::<Vec<_>>()
        .join(",")
}

/// Worker running as a local child process.
pub struct BareSheep {
    config: BareSheepConfig,
    runner_config_path: Option<PathBuf>,
    child: Option<Child>,
}

impl BareSheep {
    pub fn new(config: BareSheepConfig) -> Self {
        Self { config, runner_config_path: None, child: None }
    }

    fn open_log(path: &Path) -> Result<Stdio, SheepError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SheepError::Runtime(format!("cannot create log dir: {e}")))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SheepError::Runtime(format!("cannot open log file: {e}")))?;
        Ok(Stdio::from(file))
    }
}

#[async_trait]
impl Sheep for BareSheep {
    async fn load_model(&mut self, model: &ModelRef) -> Result<(), SheepError> {
        let config_path = self
            .config
            .working_dir
            .join(&model.name)
            .join(&model.version)
            .join(RUNNER_CONFIG_FILE);
        if !config_path.exists() {
            return Err(SheepError::Configuration(format!(
                "cannot load model `{model}`, file `{}` does not exist",
                config_path.display()
            )));
        }
        self.runner_config_path = Some(
            config_path
                .strip_prefix(&self.config.working_dir)
                .unwrap_or(&config_path)
                .to_path_buf(),
        );
        Ok(())
    }

    async fn launch(&mut self) -> Result<(), SheepError> {
        let config_path = self
            .runner_config_path
            .as_ref()
            .ok_or_else(|| SheepError::Configuration("no model loaded".into()))?;

        let command_line = self
            .config
            .command
            .replace("{port}", &self.config.port.to_string())
            .replace("{config_path}", &config_path.display().to_string());
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| SheepError::Configuration("empty runner command".into()))?;

        let mut command = Command::new(program);
        command
            .args(parts)
            .current_dir(&self.config.working_dir)
            .env("CUDA_VISIBLE_DEVICES", visible_gpu_list(&self.config.devices))
            .kill_on_drop(true);
        command.stdout(match &self.config.stdout_file {
            Some(path) => Self::open_log(path)?,
            None => Stdio::null(),
        });
        command.stderr(match &self.config.stderr_file {
            Some(path) => Self::open_log(path)?,
            None => Stdio::null(),
        });

        debug!(command = %command_line, "launching runner");
        let child = command
            .spawn()
            .map_err(|e| SheepError::Runtime(format!("failed to launch runner: {e}")))?;
        self.child = Some(child);
        Ok(())
    }

    async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill runner process");
            }
        }
    }

    async fn running(&mut self) -> Result<bool, SheepError> {
        match &mut self.child {
            None => Ok(false),
            Some(child) => Ok(child
                .try_wait()
                .map_err(|e| SheepError::Runtime(format!("failed to poll runner: {e}")))?
                .is_none()),
        }
    }

    fn port(&self) -> u16 {
        self.config.port
    }
}

#[cfg(test)]
#[path = "bare_tests.rs"]
mod tests;
