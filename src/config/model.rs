// src/config/model.rs

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// retain_finished = true
///
/// [executor]
/// max_concurrent = 4
///
/// [logging]
/// level = "debug"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`.
#[derive(Debug, Clone, Default)]
pub struct DataflowConfig {
    pub scheduler: SchedulerConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

impl DataflowConfig {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            scheduler: raw.scheduler,
            executor: raw.executor,
            logging: raw.logging,
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Keep records of completed and failed tasks so they show up in
    /// snapshots and `task_state`. Drop them with `forget_finished`.
    #[serde(default = "default_retain_finished")]
    pub retain_finished: bool,
}

fn default_retain_finished() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retain_finished: default_retain_finished(),
        }
    }
}

/// `[executor]` section, used by `TokioExecutor`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Maximum number of jobs running at once. Must be >= 1.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`. If unset, the
    /// `DATAFLOW_LOG` environment variable decides, then `info`.
    #[serde(default)]
    pub level: Option<String>,
}
