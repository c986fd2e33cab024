//! Tests for loading mirror configuration files.

use std::io::Write;

use kbmirror::config::{ConfigError, MirrorConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"{
            "endpoint": "ws://kb.internal:9000/ws_json",
            "keynodes": {"login_relation": "nrel_user_login", "ui_user": "concept_ui_user"}
        }"#,
    );

    let config = MirrorConfig::load(file.path()).unwrap();
    assert_eq!(config.endpoint, "ws://kb.internal:9000/ws_json");
    assert_eq!(config.keynodes.login_relation, "nrel_user_login");
    assert_eq!(config.keynodes.ui_user, "concept_ui_user");
}

#[test]
fn test_empty_object_is_the_default_config() {
    let file = write_config("{}");
    assert_eq!(MirrorConfig::load(file.path()).unwrap(), MirrorConfig::default());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = MirrorConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));

    let err: kbmirror::Error = err.into();
    assert!(err.is_io_error());
    assert_eq!(err.module(), "config");
}

#[test]
fn test_malformed_file() {
    let file = write_config(r#"{"endpoint": 42}"#);
    let err = MirrorConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.is_file_error());
}

#[test]
fn test_invalid_endpoint_in_file() {
    let file = write_config(r#"{"endpoint": "tcp://localhost:8090"}"#);
    let err = MirrorConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));

    let err: kbmirror::Error = err.into();
    assert!(err.is_validation_error());
}
