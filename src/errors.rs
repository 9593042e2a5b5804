// src/errors.rs

//! Crate-wide error types.
//!
//! [`DataflowError`] covers structural failures of the scheduler itself
//! (identity collisions, double resolution, bookkeeping defects) plus config
//! and IO plumbing. A task payload failing is *not* a scheduler error: it is
//! a [`TaskError`] value carried inside the task's result handle.

use thiserror::Error;

use crate::types::{HandleId, TaskId};

#[derive(Error, Debug)]
pub enum DataflowError {
    #[error("Duplicate task identity: {0}")]
    DuplicateTask(TaskId),

    #[error("Result handle {0} is already resolved")]
    AlreadyResolved(HandleId),

    #[error("Task {task} indexed under handle {handle} is not pending")]
    MissingTask { task: TaskId, handle: HandleId },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DataflowError>;

/// Failure produced by a task payload (or its executor).
///
/// Cloned to every reader of the failed handle, so it only carries a
/// rendered message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        TaskError::new(format!("{err:#}"))
    }
}
