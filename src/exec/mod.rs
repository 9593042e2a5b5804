// src/exec/mod.rs

//! Execution layer.
//!
//! The scheduler never runs payloads itself; it hands them to an
//! [`ExecutorBackend`] and gets back a [`ResultHandle`] that resolves when
//! the payload finishes.
//!
//! - [`backend`] defines the `ExecutorBackend` trait and [`TokioExecutor`],
//!   a concrete backend that runs closures on the Tokio blocking pool.
//! - [`task_runner`] runs a single job and converts its result (or panic)
//!   into an outcome.
//!
//! [`ResultHandle`]: crate::handle::ResultHandle

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, Job, TokioExecutor};
