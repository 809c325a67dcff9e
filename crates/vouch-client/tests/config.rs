#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Config file loading and environment overlay.

use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;
use vouch_client::config::{ClientConfig, ConfigError, Environment};

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "vouch.toml",
        r#"
            environment = "production"
            connect_timeout_secs = 10
        "#,
    );

    let config = ClientConfig::load_from_file(&path).unwrap();

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.connect_timeout_secs, 10);
    assert_eq!(config.toast_duration_ms, 3000);
    assert_eq!(
        config.session_settings().connect_timeout,
        Duration::from_secs(10)
    );
}

#[test]
fn json_file_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "vouch.json",
        r#"{ "storage_path": "/var/lib/vouch", "toast_duration_ms": 1500 }"#,
    );

    let config = ClientConfig::load_from_file(&path).unwrap();

    assert_eq!(config.storage_path, PathBuf::from("/var/lib/vouch"));
    assert_eq!(
        config.preferences_path(),
        PathBuf::from("/var/lib/vouch/preferences.json")
    );
    assert_eq!(config.toast_duration_ms, 1500);
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "vouch.yaml", "environment: sandbox");

    assert_matches!(
        ClientConfig::load_from_file(&path),
        Err(ConfigError::UnsupportedFormat(p)) if p == path
    );
}

#[test]
fn malformed_toml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "vouch.toml", "connect_timeout_secs = \"soon\"");

    assert_matches!(
        ClientConfig::load_from_file(&path),
        Err(ConfigError::Toml(_))
    );
}

#[test]
fn vars_apply_on_top_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "vouch.toml", "log_level = \"warn\"");
    let mut config = ClientConfig::load_from_file(&path).unwrap();

    config
        .merge_with_vars([
            ("VOUCH_LOG_LEVEL", "debug"),
            ("VOUCH_STORAGE_PATH", "/tmp/vouch"),
        ])
        .unwrap();
    config.validate().unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.storage_path, PathBuf::from("/tmp/vouch"));
}

#[test]
fn zero_toast_duration_fails_validation() {
    let mut config = ClientConfig::default();
    config
        .merge_with_vars([("VOUCH_TOAST_DURATION_MS", "0")])
        .unwrap();

    assert_matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            key: "toast_duration_ms",
            ..
        })
    );
}

#[test]
fn account_config_carries_storage_and_environment() {
    let config = ClientConfig {
        environment: Environment::Production,
        ..ClientConfig::default()
    };
    let account = config.account_config();

    assert_eq!(account.environment, Environment::Production);
    assert_eq!(account.storage_path, config.storage_path);
}
