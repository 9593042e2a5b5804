// src/lib.rs

//! Dataflow task scheduler.
//!
//! Tasks are submitted together with the [`ResultHandle`]s they depend on.
//! The [`Scheduler`] holds each task until every dependency has resolved and
//! then hands its payload to an [`ExecutorBackend`]. Every submission returns
//! a handle that eventually carries the task's result, whether the task ran
//! immediately or was deferred.
//!
//! ```no_run
//! use dataflow::config::ExecutorConfig;
//! use dataflow::exec::{Job, TokioExecutor};
//! use dataflow::{ResultHandle, Scheduler};
//!
//! # async fn demo() -> dataflow::errors::Result<()> {
//! let scheduler = Scheduler::new(TokioExecutor::<u64>::current(&ExecutorConfig::default())?);
//!
//! let input = ResultHandle::<u64>::new();
//! let job: Job<u64> = Box::new(|| Ok(42));
//! let out = scheduler.submit(job, [input.as_dependency()], None)?;
//!
//! input.complete(1)?; // `out` is dispatched now
//! assert_eq!(out.resolved().await, Ok(42));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod handle;
pub mod logging;
pub mod types;

pub use dag::{Scheduler, SchedulerSnapshot};
pub use errors::{DataflowError, TaskError};
pub use exec::ExecutorBackend;
pub use handle::{Dependency, Outcome, ResultHandle};
pub use types::{HandleId, TaskId, TaskState};
