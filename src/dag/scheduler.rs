// src/dag/scheduler.rs

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::dag::scheduler_step::{ReadyTask, SubmitStep};
use crate::dag::snapshot::SchedulerSnapshot;
use crate::dag::state_manager::SchedulerState;
use crate::dag::task_info::{TaskCallback, TaskRecord};
use crate::errors::{DataflowError, Result, TaskError};
use crate::exec::ExecutorBackend;
use crate::handle::{Dependency, ResultHandle};
use crate::types::{HandleId, TaskId, TaskState};

type Payload<E> = <E as ExecutorBackend>::Payload;
type Output<E> = <E as ExecutorBackend>::Output;

/// Dataflow scheduler: holds tasks until their dependencies resolve, then
/// hands them to the executor.
///
/// It is responsible for:
/// - counting each task's unresolved dependencies at submission
/// - indexing pending tasks under the handles they wait on
/// - counting tasks down as handles resolve, and dispatching at zero
/// - wiring each dispatch handle to the caller-facing result handle and
///   the task's callback
///
/// Cloning a `Scheduler` yields another reference to the same instance.
pub struct Scheduler<E: ExecutorBackend> {
    shared: Arc<Shared<E>>,
}

struct Shared<E: ExecutorBackend> {
    state: Mutex<SchedulerState<Payload<E>, Output<E>>>,
    executor: E,
}

impl<E: ExecutorBackend> Clone for Scheduler<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: ExecutorBackend> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Scheduler")
            .field("pending", &state.pending_count())
            .field("in_flight", &state.in_flight_count())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Scheduler<E> {
    /// Construct a scheduler with default settings.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, &SchedulerConfig::default())
    }

    pub fn with_config(executor: E, cfg: &SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState::new(cfg.retain_finished)),
                executor,
            }),
        }
    }

    /// Submit a task under a fresh identity.
    ///
    /// The returned handle is valid immediately. With no unresolved
    /// dependencies the payload is dispatched before this returns; otherwise
    /// it is dispatched when the last dependency resolves.
    pub fn submit(
        &self,
        payload: Payload<E>,
        dependencies: impl IntoIterator<Item = Dependency>,
        callback: Option<TaskCallback<Output<E>>>,
    ) -> Result<ResultHandle<Output<E>>> {
        self.submit_with_id(TaskId::new(), payload, dependencies, callback)
    }

    /// Submit a task under a caller-chosen identity.
    ///
    /// Fails with [`DataflowError::DuplicateTask`] if `id` is already known;
    /// scheduler state is left untouched in that case.
    pub fn submit_with_id(
        &self,
        id: TaskId,
        payload: Payload<E>,
        dependencies: impl IntoIterator<Item = Dependency>,
        callback: Option<TaskCallback<Output<E>>>,
    ) -> Result<ResultHandle<Output<E>>> {
        let result = ResultHandle::new();
        let record = TaskRecord::new(
            id,
            dependencies.into_iter().collect(),
            payload,
            callback,
            result.clone(),
        );

        let step = self.shared.lock().admit(record);

        match step {
            SubmitStep::Duplicate(rejected) => {
                // User payloads and callbacks are never dropped under the lock.
                drop(rejected);
                return Err(DataflowError::DuplicateTask(id));
            }
            SubmitStep::Dispatch(ready) => self.shared.dispatch(ready),
            SubmitStep::Deferred { remaining, watch } => {
                debug!(task = %id, remaining, "task deferred until dependencies resolve");
                // Watching happens outside the lock: a handle that resolved
                // since `admit` fires the subscription straight away.
                for dep in watch {
                    self.shared.watch(dep);
                }
            }
        }

        Ok(result)
    }

    /// Propagate the resolution of `dependency` to the tasks waiting on it.
    ///
    /// This already happens automatically for every handle a pending task
    /// waits on. Calling it for a handle that is not resolved yet does
    /// nothing, and repeated calls for the same handle are no-ops.
    pub fn notify_resolved(&self, dependency: &Dependency) -> Result<()> {
        if !dependency.is_done() {
            debug!(handle = %dependency.id(), "ignoring notification for unresolved handle");
            return Ok(());
        }
        self.shared.notify_resolved(dependency.id())
    }

    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.shared.lock().task_state(id)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending_count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.shared.lock().in_flight_count()
    }

    /// No pending tasks and nothing awaiting an executor result.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.lock();
        state.pending_count() == 0 && state.in_flight_count() == 0
    }

    /// Drop retained records of completed and failed tasks.
    pub fn forget_finished(&self) -> usize {
        self.shared.lock().forget_finished()
    }

    /// Consistent copy of the pending set, dependency index and dispatched
    /// set.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.shared.lock().snapshot()
    }

    /// Emit the current snapshot at debug level.
    pub fn log_state(&self) {
        let snapshot = self.snapshot();
        debug!(
            pending = snapshot.pending.len(),
            lookup = snapshot.lookup.len(),
            dispatched = snapshot.dispatched.len(),
            "scheduler state:\n{snapshot}"
        );
    }
}

impl<E: ExecutorBackend> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, SchedulerState<Payload<E>, Output<E>>> {
        // No user code runs under this lock, so a poisoned state is still
        // consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_resolved(self: &Arc<Self>, handle: HandleId) -> Result<()> {
        let step = self.lock().resolve(handle);

        if !step.decremented.is_empty() {
            debug!(
                handle = %handle,
                decremented = step.decremented.len(),
                ready = step.ready.len(),
                "propagated handle resolution"
            );
        }

        for ready in step.ready {
            self.dispatch(ready);
        }

        match step.missing.first() {
            Some(&task) => Err(DataflowError::MissingTask { task, handle }),
            None => Ok(()),
        }
    }

    /// Subscribe to `dep` so its resolution is propagated.
    fn watch(self: &Arc<Self>, dep: Dependency) {
        let handle = dep.id();
        let weak: Weak<Self> = Arc::downgrade(self);

        dep.subscribe(Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                debug!(handle = %handle, "scheduler dropped before dependency resolved");
                return;
            };
            if let Err(err) = shared.notify_resolved(handle) {
                error!(handle = %handle, error = %err, "resolution propagation failed");
            }
        }));
    }

    /// Hand a ready task to the executor and wire up its completion.
    ///
    /// The task is already recorded as dispatched; this runs outside the lock
    /// because executors may settle the handle synchronously. An executor
    /// that panics while accepting the payload fails the task instead, so the
    /// caller's handle still settles and sibling tasks still get dispatched.
    fn dispatch(self: &Arc<Self>, ready: ReadyTask<Payload<E>, Output<E>>) {
        let ReadyTask {
            id,
            payload,
            callback,
            result,
        } = ready;

        info!(task = %id, "dispatching task to executor");
        let accepted = panic::catch_unwind(AssertUnwindSafe(move || {
            self.executor.dispatch(id, payload)
        }));
        let dispatch_handle = match accepted {
            Ok(handle) => handle,
            Err(panic) => {
                let message = crate::handle::panic_message(panic.as_ref());
                error!(task = %id, panic = %message, "executor panicked during dispatch");
                ResultHandle::failed_with(TaskError::new(format!(
                    "executor panicked while dispatching task {id}: {message}"
                )))
            }
        };

        let weak = Arc::downgrade(self);
        dispatch_handle.on_resolved(move |outcome| {
            if let Err(err) = result.settle(outcome.clone()) {
                warn!(task = %id, error = %err, "result handle was settled outside the scheduler");
            }

            if let Some(shared) = weak.upgrade() {
                shared.lock().finish(id, outcome.is_ok());
            }

            if let Some(callback) = callback {
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(outcome))) {
                    error!(
                        task = %id,
                        panic = %crate::handle::panic_message(panic.as_ref()),
                        "task callback panicked"
                    );
                }
            }
        });
    }
}
