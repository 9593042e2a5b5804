// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{DataflowConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DataflowConfig> {
    let raw_config = load_from_path(&path)?;
    DataflowConfig::try_from(raw_config)
}

impl DataflowConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfigFile = toml::from_str(contents)?;
        Self::try_from(raw)
    }
}

/// Conventional config file name in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dataflow.toml")
}
