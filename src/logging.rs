// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `[logging].level` from config (if provided)
//! 2. `DATAFLOW_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to STDERR.

use anyhow::anyhow;
use tracing_subscriber::fmt;

use crate::config::LoggingConfig;
use crate::errors::Result;

/// Environment variable consulted when the config sets no level.
pub const LOG_ENV_VAR: &str = "DATAFLOW_LOG";

/// Install the global logging subscriber.
///
/// Fails if another global subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let level = resolve_level(cfg.level.as_deref(), std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from the configured value and the env var.
pub fn resolve_level(configured: Option<&str>, env: Option<&str>) -> tracing::Level {
    configured
        .and_then(parse_level_str)
        .or_else(|| env.and_then(parse_level_str))
        .unwrap_or(tracing::Level::INFO)
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
