// src/dag/scheduler_step.rs

//! Result types for individual bookkeeping steps.
//!
//! [`SchedulerState`](crate::dag::SchedulerState) never talks to the executor
//! or to handles' callback lists; it returns one of these and the caller
//! performs the side effects outside the lock.

use crate::dag::task_info::{TaskCallback, TaskRecord};
use crate::handle::{Dependency, ResultHandle};
use crate::types::TaskId;

/// A task whose counter reached zero and which is now recorded as
/// dispatched; its payload still has to be handed to the executor.
pub struct ReadyTask<P, T> {
    pub id: TaskId,
    pub payload: P,
    pub callback: Option<TaskCallback<T>>,
    pub result: ResultHandle<T>,
}

impl<P, T> std::fmt::Debug for ReadyTask<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyTask")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Outcome of admitting a new task.
#[derive(Debug)]
pub enum SubmitStep<P, T> {
    /// No unresolved dependencies: dispatch now.
    Dispatch(ReadyTask<P, T>),
    /// Stored as pending.
    Deferred {
        remaining: usize,
        /// Handles that gained their first waiter and must now be watched.
        watch: Vec<Dependency>,
    },
    /// Identity already known. The record comes back untouched so its
    /// payload and callback are dropped after the lock is released.
    Duplicate(TaskRecord<P, T>),
}

/// Outcome of propagating one handle's resolution.
#[derive(Debug)]
pub struct PropagationStep<P, T> {
    /// Tasks that were counted down by this resolution.
    pub decremented: Vec<TaskId>,
    /// Tasks whose counter reached zero, now moved to the dispatched set.
    pub ready: Vec<ReadyTask<P, T>>,
    /// Tasks the index referenced but which were not pending.
    pub missing: Vec<TaskId>,
}

impl<P, T> PropagationStep<P, T> {
    pub fn empty() -> Self {
        Self {
            decremented: Vec::new(),
            ready: Vec::new(),
            missing: Vec::new(),
        }
    }
}
