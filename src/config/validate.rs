// src/config/validate.rs

use tokio::sync::Semaphore;

use crate::config::model::{DataflowConfig, RawConfigFile};
use crate::errors::{DataflowError, Result};
use crate::logging::parse_level_str;

impl TryFrom<RawConfigFile> for DataflowConfig {
    type Error = DataflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(DataflowConfig::new_unchecked(raw))
    }
}

/// Check semantic constraints serde cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_executor(cfg)?;
    validate_logging(cfg)?;
    Ok(())
}

fn validate_executor(cfg: &RawConfigFile) -> Result<()> {
    if cfg.executor.max_concurrent == 0 {
        return Err(DataflowError::ConfigError(
            "[executor].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.executor.max_concurrent > Semaphore::MAX_PERMITS {
        return Err(DataflowError::ConfigError(format!(
            "[executor].max_concurrent must be <= {} (got {})",
            Semaphore::MAX_PERMITS,
            cfg.executor.max_concurrent
        )));
    }
    Ok(())
}

fn validate_logging(cfg: &RawConfigFile) -> Result<()> {
    if let Some(level) = cfg.logging.level.as_deref() {
        if parse_level_str(level).is_none() {
            return Err(DataflowError::ConfigError(format!(
                "[logging].level '{level}' is not one of error, warn, info, debug, trace"
            )));
        }
    }
    Ok(())
}
