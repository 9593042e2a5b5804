// src/dag/snapshot.rs

//! Read-only diagnostic view of scheduler state.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{HandleId, TaskId, TaskState};

/// A pending task as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTaskView {
    pub id: TaskId,
    pub remaining: usize,
    /// All dependencies in submission order.
    pub dependencies: Vec<HandleId>,
    /// The subset still being waited on.
    pub waiting_on: Vec<HandleId>,
}

/// Point-in-time copy of the pending set, the dependency index and the
/// dispatched set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    /// Sorted by task id.
    pub pending: Vec<PendingTaskView>,
    pub lookup: BTreeMap<HandleId, Vec<TaskId>>,
    /// Dispatched (and retained finished) tasks, sorted by task id.
    pub dispatched: Vec<(TaskId, TaskState)>,
}

impl SchedulerSnapshot {
    pub fn pending_task(&self, id: TaskId) -> Option<&PendingTaskView> {
        self.pending.iter().find(|view| view.id == id)
    }

    pub fn dispatched_state(&self, id: TaskId) -> Option<TaskState> {
        self.dispatched
            .iter()
            .find(|(task, _)| *task == id)
            .map(|(_, state)| *state)
    }

    pub fn waiters_of(&self, handle: HandleId) -> &[TaskId] {
        self.lookup.get(&handle).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for SchedulerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pending :")?;
        for view in &self.pending {
            writeln!(
                f,
                "Task {} : DepCnt:{} | Deps:{}",
                view.id,
                view.remaining,
                join(&view.dependencies)
            )?;
        }

        writeln!(f, "Lookup  :")?;
        for (handle, tasks) in &self.lookup {
            writeln!(f, "{:>10} : {}", handle.to_string(), join(tasks))?;
        }

        writeln!(f, "Dispatched :")?;
        for (task, state) in &self.dispatched {
            writeln!(f, "Task {task} : {state}")?;
        }
        Ok(())
    }
}

fn join<I: fmt::Display>(items: &[I]) -> String {
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
