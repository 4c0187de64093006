// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! The sheep table is an [`IndexMap`], so "the first configured sheep" (the
//! default assignment target) is the first one in the file, deterministically.

use crate::error::{SheepError, ShepherdError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Registry the container sheep pull model images from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RegistryConfig {
    /// The registry URL without its scheme, as used in image names.
    pub fn schemeless_url(&self) -> &str {
        match self.url.find("://") {
            Some(idx) => &self.url[idx + 3..],
            None => &self.url,
        }
    }
}

fn default_runner_command() -> String {
    "shepherd-runner -p {port} {config_path}".to_string()
}

/// Configuration of a bare (child-process) sheep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BareSheepConfig {
    pub port: u16,
    #[serde(default)]
    pub devices: Vec<String>,
    /// Directory the runner executes in; model directories live below it.
    pub working_dir: PathBuf,
    /// Capture the runner's stdout here instead of discarding it.
    #[serde(default)]
    pub stdout_file: Option<PathBuf>,
    /// Capture the runner's stderr here instead of discarding it.
    #[serde(default)]
    pub stderr_file: Option<PathBuf>,
    /// Runner command template; `{port}` and `{config_path}` are substituted.
    #[serde(default = "default_runner_command")]
    pub command: String,
}

/// Configuration of a container sheep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSheepConfig {
    pub port: u16,
    #[serde(default)]
    pub devices: Vec<String>,
    /// Remove the container when it stops instead of keeping it around.
    #[serde(default)]
    pub autoremove: bool,
}

/// Configuration of a dummy (in-process) sheep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummySheepConfig {
    /// Port to serve on; 0 picks an ephemeral port.
    pub port: u16,
}

/// Per-sheep configuration, tagged by sheep kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SheepConfig {
    Bare(BareSheepConfig),
    Container(ContainerSheepConfig),
    Dummy(DummySheepConfig),
}

impl SheepConfig {
    /// Kind name used in logs and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            SheepConfig::Bare(_) => "bare",
            SheepConfig::Container(_) => "container",
            SheepConfig::Dummy(_) => "dummy",
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            SheepConfig::Bare(c) => c.port,
            SheepConfig::Container(c) => c.port,
            SheepConfig::Dummy(c) => c.port,
        }
    }
}

fn default_status_workers() -> usize {
    1
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShepherdConfig {
    /// Directory where the per-sheep working directories are managed.
    pub data_root: PathBuf,
    /// Include exception types and traces in persisted error details.
    #[serde(default)]
    pub debug: bool,
    /// Workers draining the status-update queue. One keeps per-job writes
    /// strictly ordered.
    #[serde(default = "default_status_workers")]
    pub status_workers: usize,
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
    pub sheep: IndexMap<String, SheepConfig>,
}

impl ShepherdConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ShepherdError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ShepherdError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ShepherdError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ShepherdError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Check cross-field requirements.
    pub fn validate(&self) -> Result<(), ShepherdError> {
        if self.sheep.is_empty() {
            return Err(ShepherdError::Config("at least one sheep must be configured".into()));
        }
        if self.status_workers == 0 {
            return Err(ShepherdError::Config("status_workers must be at least 1".into()));
        }
        for (id, sheep) in &self.sheep {
            if matches!(sheep, SheepConfig::Container(_)) && self.registry.is_none() {
                return Err(SheepError::Configuration(format!(
                    "sheep `{id}`: to use container sheep, configure a registry URL"
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
