// src/dag/state_manager.rs

//! Bookkeeping for pending and dispatched tasks.
//!
//! `SchedulerState` is a plain single-threaded state machine: it does not
//! lock, call the executor, or touch handle callbacks. [`Scheduler`] wraps it
//! in a mutex and performs the side effects each step asks for, which keeps
//! every counter update and the pending → dispatched move inside one
//! critical section.
//!
//! [`Scheduler`]: crate::dag::Scheduler

use std::collections::HashMap;

use tracing::{debug, error, warn};

use crate::dag::index::DependencyIndex;
use crate::dag::scheduler_step::{PropagationStep, ReadyTask, SubmitStep};
use crate::dag::snapshot::{PendingTaskView, SchedulerSnapshot};
use crate::dag::task_info::{DispatchedTask, TaskRecord};
use crate::types::{HandleId, TaskId, TaskState};

#[derive(Debug)]
pub struct SchedulerState<P, T> {
    pending: HashMap<TaskId, TaskRecord<P, T>>,
    dispatched: HashMap<TaskId, DispatchedTask>,
    index: DependencyIndex,
    /// Keep `Completed`/`Failed` records around for introspection.
    retain_finished: bool,
}

impl<P, T> SchedulerState<P, T> {
    pub fn new(retain_finished: bool) -> Self {
        Self {
            pending: HashMap::new(),
            dispatched: HashMap::new(),
            index: DependencyIndex::new(),
            retain_finished,
        }
    }

    /// Whether `id` is known in either the pending or the dispatched set.
    pub fn contains(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id) || self.dispatched.contains_key(&id)
    }

    /// Admit a freshly submitted task.
    ///
    /// Dependencies are checked and the task indexed in the same step, so a
    /// dependency resolving concurrently is either excluded here or counted
    /// down later by [`resolve`](Self::resolve), never both.
    ///
    /// A known identity leaves the state untouched and hands the record back
    /// as [`SubmitStep::Duplicate`].
    pub fn admit(&mut self, mut record: TaskRecord<P, T>) -> SubmitStep<P, T> {
        let id = record.id;
        if self.contains(id) {
            error!(task = %id, "duplicate task identity at submission");
            return SubmitStep::Duplicate(record);
        }

        let unresolved = record.observe_dependencies();
        let remaining = record.remaining;

        if remaining == 0 {
            debug!(
                task = %id,
                dependencies = record.dependencies.len(),
                "no unresolved dependencies; dispatching immediately"
            );
            return SubmitStep::Dispatch(self.move_to_dispatched(record));
        }

        let mut watch = Vec::new();
        for dep in unresolved {
            if self.index.insert(dep.id(), id) {
                watch.push(dep);
            }
        }

        debug!(
            task = %id,
            remaining,
            newly_watched = watch.len(),
            "task stored as pending"
        );
        self.pending.insert(id, record);

        SubmitStep::Deferred { remaining, watch }
    }

    /// Propagate the resolution of `handle` to every task waiting on it.
    ///
    /// A handle with no registered waiters (never indexed, or already
    /// propagated) is a no-op.
    pub fn resolve(&mut self, handle: HandleId) -> PropagationStep<P, T> {
        let mut step = PropagationStep::empty();

        let Some(waiters) = self.index.take(handle) else {
            debug!(handle = %handle, "resolved handle has no waiters");
            return step;
        };

        let mut ready_ids = Vec::new();
        for task in waiters {
            let Some(record) = self.pending.get_mut(&task) else {
                error!(
                    task = %task,
                    handle = %handle,
                    "dependency index references a task that is not pending"
                );
                step.missing.push(task);
                continue;
            };

            if !record.mark_resolved(handle) {
                warn!(
                    task = %task,
                    handle = %handle,
                    "task indexed under a handle it is not waiting on; skipping"
                );
                continue;
            }

            debug!(
                task = %task,
                handle = %handle,
                remaining = record.remaining,
                "dependency resolved"
            );
            step.decremented.push(task);

            if record.remaining == 0 {
                ready_ids.push(task);
            }
        }

        for task in ready_ids {
            if let Some(record) = self.pending.remove(&task) {
                step.ready.push(self.move_to_dispatched(record));
            }
        }

        step
    }

    fn move_to_dispatched(&mut self, record: TaskRecord<P, T>) -> ReadyTask<P, T> {
        // Entries under resolved handles are already gone; this only matters
        // if a handle was counted as done without being propagated here.
        self.index.remove_task(record.id, record.dependency_ids());

        let (dispatched, ready) = record.into_dispatch();
        self.dispatched.insert(dispatched.id, dispatched);
        ready
    }

    /// Record the final state of a dispatched task.
    ///
    /// Returns the new state, or `None` if the task is unknown.
    pub fn finish(&mut self, id: TaskId, success: bool) -> Option<TaskState> {
        let state = if success {
            TaskState::Completed
        } else {
            TaskState::Failed
        };

        let task = self.dispatched.get_mut(&id)?;
        task.state = state;
        debug!(task = %id, state = %state, "task finished");

        if !self.retain_finished {
            self.dispatched.remove(&id);
        }
        Some(state)
    }

    /// Drop retained `Completed`/`Failed` records. Returns how many.
    pub fn forget_finished(&mut self) -> usize {
        let before = self.dispatched.len();
        self.dispatched.retain(|_, task| !task.state.is_finished());
        before - self.dispatched.len()
    }

    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        if let Some(record) = self.pending.get(&id) {
            return Some(record.state);
        }
        self.dispatched.get(&id).map(|task| task.state)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Dispatched tasks whose result is not known yet.
    pub fn in_flight_count(&self) -> usize {
        self.dispatched
            .values()
            .filter(|task| task.state == TaskState::Dispatched)
            .count()
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let mut pending: Vec<PendingTaskView> = self
            .pending
            .values()
            .map(|record| PendingTaskView {
                id: record.id,
                remaining: record.remaining,
                dependencies: record.dependency_ids(),
                waiting_on: record
                    .dependency_ids()
                    .into_iter()
                    .filter(|h| record.is_waiting_on(*h))
                    .collect(),
            })
            .collect();
        pending.sort_by_key(|view| view.id);

        let mut dispatched: Vec<(TaskId, TaskState)> = self
            .dispatched
            .values()
            .map(|task| (task.id, task.state))
            .collect();
        dispatched.sort_by_key(|(id, _)| *id);

        SchedulerSnapshot {
            pending,
            lookup: self.index.to_sorted(),
            dispatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{Dependency, ResultHandle};

    type State = SchedulerState<&'static str, u32>;

    fn record(deps: &[&ResultHandle<u32>], payload: &'static str) -> TaskRecord<&'static str, u32> {
        TaskRecord::new(
            TaskId::new(),
            deps.iter().map(|h| Dependency::from(*h)).collect(),
            payload,
            None,
            ResultHandle::new(),
        )
    }

    #[test]
    fn admit_without_dependencies_dispatches() {
        let mut state = State::new(true);
        let rec = record(&[], "c");
        let id = rec.id;

        match state.admit(rec) {
            SubmitStep::Dispatch(ready) => assert_eq!(ready.payload, "c"),
            other => panic!("expected Dispatch, got {other:?}"),
        }
        assert_eq!(state.task_state(id), Some(TaskState::Dispatched));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn already_resolved_dependencies_are_not_counted() {
        let done = ResultHandle::resolved_with(1);
        let open = ResultHandle::new();
        let mut state = State::new(true);

        match state.admit(record(&[&done, &open, &open], "t")) {
            SubmitStep::Deferred { remaining, watch } => {
                assert_eq!(remaining, 1);
                assert_eq!(watch.len(), 1);
                assert_eq!(watch[0].id(), open.id());
            }
            other => panic!("expected Deferred, got {other:?}"),
        }
    }

    #[test]
    fn only_first_waiter_asks_to_watch_a_handle() {
        let x = ResultHandle::new();
        let mut state = State::new(true);

        let first = state.admit(record(&[&x], "a"));
        let second = state.admit(record(&[&x], "b"));

        assert!(matches!(first, SubmitStep::Deferred { ref watch, .. } if watch.len() == 1));
        assert!(matches!(second, SubmitStep::Deferred { ref watch, .. } if watch.is_empty()));
        assert_eq!(state.index().waiters_of(x.id()).map(|s| s.len()), Some(2));
    }

    #[test]
    fn duplicate_identity_is_rejected_without_side_effects() {
        let x = ResultHandle::new();
        let mut state = State::new(true);
        let rec = record(&[&x], "a");
        let id = rec.id;
        state.admit(rec);

        let dup = TaskRecord::new(id, vec![], "dup", None, ResultHandle::new());
        match state.admit(dup) {
            SubmitStep::Duplicate(rejected) => assert_eq!(rejected.payload, "dup"),
            other => panic!("expected Duplicate, got {other:?}"),
        }
        assert_eq!(state.task_state(id), Some(TaskState::Pending));
        assert_eq!(state.pending_count(), 1);
    }

    #[test]
    fn resolving_twice_counts_down_once() {
        let x = ResultHandle::new();
        let y = ResultHandle::new();
        let mut state = State::new(true);
        let rec = record(&[&x, &y], "a");
        let id = rec.id;
        state.admit(rec);

        let step = state.resolve(x.id());
        assert_eq!(step.decremented, vec![id]);
        assert!(step.ready.is_empty());

        let again = state.resolve(x.id());
        assert!(again.decremented.is_empty());
        assert_eq!(state.snapshot().pending[0].remaining, 1);

        let last = state.resolve(y.id());
        assert_eq!(last.ready.len(), 1);
        assert_eq!(state.task_state(id), Some(TaskState::Dispatched));
        assert!(state.index().is_empty());
    }

    #[test]
    fn index_entry_for_non_pending_task_is_reported_missing() {
        let x = ResultHandle::<u32>::new();
        let mut state = State::new(true);
        let ghost = TaskId::new();
        state.index.insert(x.id(), ghost);

        let step = state.resolve(x.id());
        assert_eq!(step.missing, vec![ghost]);
        assert!(step.ready.is_empty());
    }

    #[test]
    fn finish_respects_retention() {
        let mut retained = State::new(true);
        let rec = record(&[], "a");
        let id = rec.id;
        retained.admit(rec);
        assert_eq!(retained.in_flight_count(), 1);
        assert_eq!(retained.finish(id, false), Some(TaskState::Failed));
        assert_eq!(retained.task_state(id), Some(TaskState::Failed));
        assert_eq!(retained.in_flight_count(), 0);
        assert_eq!(retained.forget_finished(), 1);
        assert_eq!(retained.task_state(id), None);

        let mut dropped = State::new(false);
        let rec = record(&[], "b");
        let id = rec.id;
        dropped.admit(rec);
        assert_eq!(dropped.finish(id, true), Some(TaskState::Completed));
        assert_eq!(dropped.task_state(id), None);
    }
}
