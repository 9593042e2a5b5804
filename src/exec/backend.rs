// src/exec/backend.rs

//! Executor seam for the scheduler.
//!
//! The scheduler never runs payloads itself; it hands each ready task to an
//! `ExecutorBackend` and watches the handle it gets back.
//!
//! - `TokioExecutor` runs boxed closures via `spawn_blocking` on a captured
//!   runtime, at most `max_concurrent` at a time.
//! - Test backends live in `dataflow-test-utils` and settle handles by hand
//!   or inline.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::errors::{DataflowError, Result, TaskError};
use crate::exec::task_runner::run_job;
use crate::handle::{Outcome, ResultHandle};
use crate::types::TaskId;

/// Trait abstracting how dispatched payloads are executed.
///
/// Implementations must tolerate concurrent `dispatch` calls and may settle
/// the returned handle from any thread, including synchronously before
/// `dispatch` returns. Each returned handle must eventually be settled
/// exactly once.
pub trait ExecutorBackend: Send + Sync + 'static {
    /// The work item handed over at dispatch.
    type Payload: Send + 'static;
    /// The value a successful payload produces.
    type Output: Clone + Send + Sync + 'static;

    fn dispatch(&self, task: TaskId, payload: Self::Payload) -> ResultHandle<Self::Output>;
}

/// A unit of work for [`TokioExecutor`].
pub type Job<T> = Box<dyn FnOnce() -> std::result::Result<T, TaskError> + Send + 'static>;

/// Executor backend that runs jobs on Tokio's blocking thread pool.
pub struct TokioExecutor<T> {
    runtime: Handle,
    permits: Arc<Semaphore>,
    _output: std::marker::PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for TokioExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioExecutor")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> TokioExecutor<T> {
    /// Create an executor on an explicit runtime handle.
    ///
    /// `max_concurrent` is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(runtime: Handle, cfg: &ExecutorConfig) -> Self {
        let permits = cfg.max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        if permits != cfg.max_concurrent {
            warn!(
                requested = cfg.max_concurrent,
                using = permits,
                "max_concurrent out of range; clamping"
            );
        }

        Self {
            runtime,
            permits: Arc::new(Semaphore::new(permits)),
            _output: std::marker::PhantomData,
        }
    }

    /// Create an executor on the runtime the caller is running in.
    pub fn current(cfg: &ExecutorConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            DataflowError::Runtime(format!("TokioExecutor requires a Tokio runtime: {e}"))
        })?;
        Ok(Self::new(runtime, cfg))
    }
}

impl<T: Clone + Send + Sync + 'static> ExecutorBackend for TokioExecutor<T> {
    type Payload = Job<T>;
    type Output = T;

    fn dispatch(&self, task: TaskId, payload: Job<T>) -> ResultHandle<T> {
        let handle = ResultHandle::new();
        // Built outside the future: if the runtime drops the task before or
        // while it runs, the guard still fails the handle.
        let writer = SettleOnDrop {
            task,
            handle: Some(handle.clone()),
        };
        let permits = Arc::clone(&self.permits);

        debug!(task = %task, handle = %handle.id(), "queueing job on tokio executor");

        self.runtime.spawn(async move {
            let mut writer = writer;
            // Never closed, so this always yields a permit.
            let _permit = permits.acquire_owned().await.ok();
            let outcome = run_job(task, payload).await;
            writer.settle(outcome);
        });

        handle
    }
}

/// Settles a dispatch handle exactly once, failing it on drop if the job
/// never reported back (runtime shut down).
struct SettleOnDrop<T: Clone + Send + 'static> {
    task: TaskId,
    handle: Option<ResultHandle<T>>,
}

impl<T: Clone + Send + 'static> SettleOnDrop<T> {
    fn settle(&mut self, outcome: Outcome<T>) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.settle(outcome) {
                debug!(task = %self.task, error = %err, "dispatch handle settled elsewhere");
            }
        }
    }
}

impl<T: Clone + Send + 'static> Drop for SettleOnDrop<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!(task = %self.task, "job dropped before completion; failing its handle");
            let task = self.task;
            self.settle(Err(TaskError::new(format!(
                "task {task} was cancelled before completion"
            ))));
        }
    }
}
