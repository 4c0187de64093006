// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const FULL_CONFIG: &str = r#"
data_root = "/var/lib/shepherd"
debug = true

[registry]
url = "https://registry.example.com:5000"
username = "shepherd"
password = "hunter2"

[sheep.sheep_a]
type = "container"
port = 9001
devices = ["/dev/nvidia0", "/dev/nvidia1"]
autoremove = true

[sheep.sheep_b]
type = "bare"
port = 9002
working_dir = "/opt/models"
stderr_file = "/var/log/shepherd/sheep_b.err"

[sheep.sheep_c]
type = "dummy"
port = 0
"#;

#[test]
fn full_config_parses() {
    let config = ShepherdConfig::from_toml_str(FULL_CONFIG).unwrap();
    assert_eq!(config.data_root, PathBuf::from("/var/lib/shepherd"));
    assert!(config.debug);
    assert_eq!(config.status_workers, 1);
    assert_eq!(config.registry.as_ref().unwrap().username.as_deref(), Some("shepherd"));
    assert_eq!(config.sheep.len(), 3);

    match &config.sheep["sheep_a"] {
        SheepConfig::Container(c) => {
            assert_eq!(c.port, 9001);
            assert_eq!(c.devices.len(), 2);
            assert!(c.autoremove);
        }
        other => panic!("expected container sheep, got {}", other.kind()),
    }
    match &config.sheep["sheep_b"] {
        SheepConfig::Bare(c) => {
            assert_eq!(c.working_dir, PathBuf::from("/opt/models"));
            assert!(c.stdout_file.is_none());
            assert_eq!(c.command, "shepherd-runner -p {port} {config_path}");
        }
        other => panic!("expected bare sheep, got {}", other.kind()),
    }
}

#[test]
fn sheep_order_follows_the_file() {
    let config = ShepherdConfig::from_toml_str(FULL_CONFIG).unwrap();
    let ids: Vec<&String> = config.sheep.keys().collect();
    assert_eq!(ids, ["sheep_a", "sheep_b", "sheep_c"]);
}

#[test]
fn container_sheep_without_registry_is_rejected() {
    let raw = r#"
data_root = "/tmp/shepherd"

[sheep.only]
type = "container"
port = 9001
"#;
    let err = ShepherdConfig::from_toml_str(raw).unwrap_err();
    assert!(matches!(err, ShepherdError::Sheep(SheepError::Configuration(_))));
    assert!(err.to_string().contains("registry"));
}

#[test]
fn empty_sheep_table_is_rejected() {
    let raw = r#"
data_root = "/tmp/shepherd"

[sheep]
"#;
    assert!(matches!(
        ShepherdConfig::from_toml_str(raw),
        Err(ShepherdError::Config(_))
    ));
}

#[test]
fn zero_status_workers_is_rejected() {
    let raw = r#"
data_root = "/tmp/shepherd"
status_workers = 0

[sheep.s]
type = "dummy"
port = 0
"#;
    assert!(matches!(
        ShepherdConfig::from_toml_str(raw),
        Err(ShepherdError::Config(_))
    ));
}

#[parameterized(
    https = { "https://registry.example.com", "registry.example.com" },
    http = { "http://registry.example.com", "registry.example.com" },
    bare_host = { "registry.example.com:5000", "registry.example.com:5000" },
)]
fn schemeless_url(url: &str, expected: &str) {
    let registry = RegistryConfig { url: url.into(), username: None, password: None };
    assert_eq!(registry.schemeless_url(), expected);
}
