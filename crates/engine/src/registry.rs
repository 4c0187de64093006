// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry catalog client, used by the engine health probe.

use crate::config::RegistryConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors from talking to the image registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Response shape of the `/v2/_catalog` endpoint.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    repositories: Vec<String>,
}

/// List the image names the registry knows about.
pub async fn list_registry_images(
    client: &reqwest::Client,
    config: &RegistryConfig,
) -> Result<Vec<String>, RegistryError> {
    let url = format!("{}/v2/_catalog", config.url.trim_end_matches('/'));
    let mut request = client.get(&url);
    if let Some(username) = &config.username {
        request = request.basic_auth(username, config.password.as_deref());
    }
    let response = request.send().await?.error_for_status()?;
    let catalog: CatalogResponse = response.json().await?;
    Ok(catalog.repositories)
}
