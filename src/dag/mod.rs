// src/dag/mod.rs

//! Dependency tracking and dispatch.
//!
//! - [`scheduler`] contains the thread-safe [`Scheduler`] façade.
//! - [`state_manager`] holds the pending/dispatched bookkeeping it locks.
//! - [`index`] is the reverse map from a handle to its waiting tasks.
//! - [`task_info`] defines pending and dispatched task records.
//! - [`scheduler_step`] defines the result types for bookkeeping steps.
//! - [`snapshot`] is the read-only diagnostic view.

pub mod index;
pub mod scheduler;
pub mod scheduler_step;
pub mod snapshot;
pub mod state_manager;
pub mod task_info;

pub use index::DependencyIndex;
pub use scheduler::Scheduler;
pub use scheduler_step::{PropagationStep, ReadyTask, SubmitStep};
pub use snapshot::{PendingTaskView, SchedulerSnapshot};
pub use state_manager::SchedulerState;
pub use task_info::{DispatchedTask, TaskCallback, TaskRecord};
