//! Tests for config functionality.

use crate::config::{DEFAULT_POLL_INTERVAL_MS, LockConfig};
use crate::error::LockError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = LockConfig::default();

    assert_eq!(config.timeout_ms, None);
    assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert!(config.reclaim_stale);
    assert_eq!(config.timeout(), None);
    assert_eq!(config.poll_interval(), Duration::from_millis(50));
}

#[test]
fn test_parse_minimal_yaml() {
    let config = LockConfig::from_yaml("").unwrap();
    assert_eq!(config, LockConfig::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
timeout_ms: 200
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.timeout(), Some(Duration::from_millis(200)));
    assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert!(config.reclaim_stale);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
timeout_ms: 0
poll_interval_ms: 10
reclaim_stale: false
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.timeout(), Some(Duration::ZERO));
    assert_eq!(config.poll_interval(), Duration::from_millis(10));
    assert!(!config.reclaim_stale);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
poll_interval_ms: 25
some_future_setting: true
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.poll_interval_ms, 25);
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let result = LockConfig::from_yaml("poll_interval_ms: 0\n");
    let err = result.unwrap_err();
    assert!(matches!(err, LockError::Config(_)));
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let result = LockConfig::from_yaml("timeout_ms: [not, a, number]\n");
    assert!(matches!(result, Err(LockError::Config(_))));
}

#[test]
fn test_yaml_roundtrip_preserves_values() {
    let config = LockConfig {
        timeout_ms: Some(1500),
        poll_interval_ms: 20,
        reclaim_stale: false,
    };

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("timeout_ms: 1500"));
    assert_eq!(LockConfig::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lock.yaml");
    std::fs::write(&path, "timeout_ms: 5000\n").unwrap();

    let config = LockConfig::load(&path).unwrap();
    assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = LockConfig::load(temp_dir.path().join("missing.yaml"));
    assert!(matches!(result, Err(LockError::Io { .. })));
}
