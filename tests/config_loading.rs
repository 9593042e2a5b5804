// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;

use dataflow::config::{load_and_validate, load_from_path, DataflowConfig};
use dataflow::errors::DataflowError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_loaded() {
    let file = write_config(
        r#"
[scheduler]
retain_finished = false

[executor]
max_concurrent = 8

[logging]
level = "debug"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(!cfg.scheduler.retain_finished);
    assert_eq!(cfg.executor.max_concurrent, 8);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[test]
fn empty_config_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.scheduler.retain_finished);
    assert_eq!(cfg.executor.max_concurrent, 4);
    assert_eq!(cfg.logging.level, None);
}

#[test]
fn zero_concurrency_returns_config_error() {
    let err = DataflowConfig::from_toml_str("[executor]\nmax_concurrent = 0\n").unwrap_err();
    match err {
        DataflowError::ConfigError(msg) => assert!(msg.contains("max_concurrent")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn oversized_concurrency_returns_config_error() {
    let too_many = tokio::sync::Semaphore::MAX_PERMITS + 1;
    let toml = format!("[executor]\nmax_concurrent = {too_many}\n");
    let err = DataflowConfig::from_toml_str(&toml).unwrap_err();
    match err {
        DataflowError::ConfigError(msg) => assert!(msg.contains("max_concurrent")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn unknown_log_level_returns_config_error() {
    let err = DataflowConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
    match err {
        DataflowError::ConfigError(msg) => assert!(msg.contains("loud")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn unknown_key_returns_toml_error() {
    let file = write_config("[executor]\nthreads = 3\n");
    let result = load_from_path(file.path());
    assert!(matches!(result, Err(DataflowError::TomlError(_))));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Dataflow.toml"));
    assert!(matches!(result, Err(DataflowError::IoError(_))));
}
