// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn registry() -> RegistryConfig {
    RegistryConfig {
        url: "https://registry.example.com:5000".into(),
        username: None,
        password: None,
    }
}

#[test]
fn image_full_name_strips_the_scheme() {
    let image = DockerImage::new("classify", "v3", registry());
    assert_eq!(image.full_name(), "registry.example.com:5000/classify:v3");
}

#[tokio::test]
async fn kill_without_start_is_a_no_op() {
    let mut container = DockerContainer::new(DockerImage::new("m", "v", registry()), false);
    container.kill().await.unwrap();
}

#[tokio::test]
async fn unstarted_container_is_not_running() {
    let container = DockerContainer::new(DockerImage::new("m", "v", registry()), true);
    assert!(!container.running().await.unwrap());
}
