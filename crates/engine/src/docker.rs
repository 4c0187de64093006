// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin adapter over the `docker` CLI for container sheep.

use crate::config::RegistryConfig;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from driving the container runtime.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to run docker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("`docker {command}` failed: {stderr}")]
    Command { command: String, stderr: String },
}

async fn run_docker(args: &[String]) -> Result<String, DockerError> {
    debug!(args = %args.join(" "), "running docker");
    let output = Command::new("docker").args(args).output().await?;
    if !output.status.success() {
        return Err(DockerError::Command {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A model image in the configured registry.
#[derive(Debug, Clone)]
pub struct DockerImage {
    name: String,
    version: String,
    registry: RegistryConfig,
}

impl DockerImage {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registry: RegistryConfig,
    ) -> Self {
        Self { name: name.into(), version: version.into(), registry }
    }

    /// Fully qualified image reference including the registry host.
    pub fn full_name(&self) -> String {
        format!("{}/{}:{}", self.registry.schemeless_url(), self.name, self.version)
    }

    /// Pull the image from the registry.
    pub async fn pull(&self) -> Result<(), DockerError> {
        run_docker(&["pull".to_string(), self.full_name()]).await.map(|_| ())
    }
}

/// A single worker container.
#[derive(Debug)]
pub struct DockerContainer {
    image: DockerImage,
    autoremove: bool,
    env: Vec<(String, String)>,
    runtime: Option<String>,
    bind_mounts: Vec<(PathBuf, PathBuf)>,
    ports: Vec<(u16, u16)>,
    container_id: Option<String>,
}

impl DockerContainer {
    pub fn new(image: DockerImage, autoremove: bool) -> Self {
        Self {
            image,
            autoremove,
            env: Vec::new(),
            runtime: None,
            bind_mounts: Vec::new(),
            ports: Vec::new(),
            container_id: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    pub fn bind_mount(mut self, host: PathBuf, container: PathBuf) -> Self {
        self.bind_mounts.push((host, container));
        self
    }

    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.push((host, container));
        self
    }

    /// Start the container detached and remember its id.
    pub async fn start(&mut self) -> Result<(), DockerError> {
        let mut args = vec!["run".to_string(), "-d".to_string()];
        if self.autoremove {
            args.push("--rm".to_string());
        }
        if let Some(runtime) = &self.runtime {
            args.push(format!("--runtime={runtime}"));
        }
        for (host, container) in &self.ports {
            args.push("-p".to_string());
            args.push(format!("{host}:{container}"));
        }
        for (host, container) in &self.bind_mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}", host.display(), container.display()));
        }
        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(self.image.full_name());

        let stdout = run_docker(&args).await?;
        self.container_id = Some(stdout.trim().to_string());
        Ok(())
    }

    /// Kill the container (and remove it unless autoremove already does).
    pub async fn kill(&mut self) -> Result<(), DockerError> {
        let Some(id) = self.container_id.take() else {
            return Ok(());
        };
        run_docker(&["kill".to_string(), id.clone()]).await?;
        if !self.autoremove {
            // failure to remove a dead container is not worth failing jobs over
            if let Err(err) = run_docker(&["rm".to_string(), "-f".to_string(), id]).await {
                debug!(error = %err, "failed to remove stopped container");
            }
        }
        Ok(())
    }

    /// Check whether the container is still running.
    pub async fn running(&self) -> Result<bool, DockerError> {
        let Some(id) = &self.container_id else {
            return Ok(false);
        };
        let stdout = run_docker(&[
            "inspect".to_string(),
            "-f".to_string(),
            "{{.State.Running}}".to_string(),
            id.clone(),
        ])
        .await?;
        Ok(stdout.trim() == "true")
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
