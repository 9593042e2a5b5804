// src/dag/task_info.rs

//! Task records: the pending form (owns the payload) and the dispatched form
//! (owns the dispatch handle).

use std::collections::HashSet;
use std::fmt;

use crate::dag::scheduler_step::ReadyTask;
use crate::handle::{Dependency, Outcome, ResultHandle};
use crate::types::{HandleId, TaskId, TaskState};

/// Invoked once with the task's outcome, after its result handle is settled.
pub type TaskCallback<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;

/// A submitted task that has not been dispatched yet.
pub struct TaskRecord<P, T> {
    pub id: TaskId,
    /// Dependencies in submission order (duplicates kept as given).
    pub dependencies: Vec<Dependency>,
    pub payload: P,
    pub callback: Option<TaskCallback<T>>,
    /// Number of distinct dependencies still unresolved.
    pub(crate) remaining: usize,
    pub(crate) state: TaskState,
    /// Caller-facing handle, created at submission.
    pub result: ResultHandle<T>,
    /// Distinct unresolved dependency handles; each may be counted down once.
    waiting_on: HashSet<HandleId>,
}

impl<P, T> TaskRecord<P, T> {
    pub fn new(
        id: TaskId,
        dependencies: Vec<Dependency>,
        payload: P,
        callback: Option<TaskCallback<T>>,
        result: ResultHandle<T>,
    ) -> Self {
        Self {
            id,
            dependencies,
            payload,
            callback,
            remaining: 0,
            state: TaskState::Pending,
            result,
            waiting_on: HashSet::new(),
        }
    }

    /// Check every dependency and record the ones still unresolved.
    ///
    /// Returns the distinct unresolved dependencies; `remaining` is set to
    /// their count. A handle listed twice is counted once.
    pub fn observe_dependencies(&mut self) -> Vec<Dependency> {
        self.waiting_on.clear();
        let mut unresolved = Vec::new();

        for dep in &self.dependencies {
            if !dep.is_done() && self.waiting_on.insert(dep.id()) {
                unresolved.push(dep.clone());
            }
        }

        self.remaining = self.waiting_on.len();
        unresolved
    }

    /// Count down `handle` if this task is still waiting on it.
    ///
    /// Returns `false` (and leaves the counter alone) for a handle that was
    /// already counted down or was never awaited.
    pub fn mark_resolved(&mut self, handle: HandleId) -> bool {
        if self.waiting_on.remove(&handle) {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_waiting_on(&self, handle: HandleId) -> bool {
        self.waiting_on.contains(&handle)
    }

    pub fn dependency_ids(&self) -> Vec<HandleId> {
        self.dependencies.iter().map(Dependency::id).collect()
    }

    /// Split into the dispatched bookkeeping record and the work to hand to
    /// the executor.
    pub fn into_dispatch(self) -> (DispatchedTask, ReadyTask<P, T>) {
        let dispatched = DispatchedTask {
            id: self.id,
            dependencies: self.dependency_ids(),
            state: TaskState::Dispatched,
        };
        let ready = ReadyTask {
            id: self.id,
            payload: self.payload,
            callback: self.callback,
            result: self.result,
        };
        (dispatched, ready)
    }
}

impl<P, T> fmt::Debug for TaskRecord<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("dependencies", &self.dependency_ids())
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// A task that has been handed to the executor.
///
/// Holds no handle or output, so a retained record never keeps a result
/// alive after its caller has dropped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedTask {
    pub id: TaskId,
    pub dependencies: Vec<HandleId>,
    /// `Dispatched`, then `Completed` or `Failed`.
    pub state: TaskState,
}
