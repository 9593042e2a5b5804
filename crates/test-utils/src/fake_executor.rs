use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dataflow::errors::{Result, TaskError};
use dataflow::exec::{ExecutorBackend, Job};
use dataflow::{ResultHandle, TaskId};

/// A fake executor that:
/// - records every dispatched task and its payload
/// - leaves the dispatch handle unresolved until the test settles it.
///
/// Cloning shares the record, so a test can keep a clone after moving one
/// into the scheduler (or reach it through `Scheduler::executor`).
pub struct ManualExecutor<P, T> {
    inner: Arc<Mutex<ManualInner<P, T>>>,
}

struct ManualInner<P, T> {
    order: Vec<(TaskId, P)>,
    handles: HashMap<TaskId, ResultHandle<T>>,
}

impl<P, T> Clone for ManualExecutor<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T> Default for ManualExecutor<P, T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualInner {
                order: Vec::new(),
                handles: HashMap::new(),
            })),
        }
    }
}

impl<P: Clone, T: Clone + Send + Sync + 'static> ManualExecutor<P, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task ids in dispatch order.
    pub fn dispatched(&self) -> Vec<TaskId> {
        self.inner.lock().unwrap().order.iter().map(|(id, _)| *id).collect()
    }

    /// Payloads in dispatch order.
    pub fn payloads(&self) -> Vec<P> {
        self.inner.lock().unwrap().order.iter().map(|(_, p)| p.clone()).collect()
    }

    /// How many times `id` was dispatched.
    pub fn dispatch_count(&self, id: TaskId) -> usize {
        self.inner.lock().unwrap().order.iter().filter(|(t, _)| *t == id).count()
    }

    pub fn handle_of(&self, id: TaskId) -> Option<ResultHandle<T>> {
        self.inner.lock().unwrap().handles.get(&id).cloned()
    }

    /// Resolve the dispatch handle of `id`. The lock is released first, so
    /// callbacks may dispatch further tasks.
    pub fn complete(&self, id: TaskId, value: T) -> Result<()> {
        let handle = self.handle_of(id).expect("task was never dispatched");
        handle.complete(value)
    }

    pub fn fail(&self, id: TaskId, message: &str) -> Result<()> {
        let handle = self.handle_of(id).expect("task was never dispatched");
        handle.fail(TaskError::new(message))
    }
}

impl<P, T> ExecutorBackend for ManualExecutor<P, T>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Payload = P;
    type Output = T;

    fn dispatch(&self, task: TaskId, payload: P) -> ResultHandle<T> {
        let handle = ResultHandle::new();
        let mut inner = self.inner.lock().unwrap();
        inner.order.push((task, payload));
        inner.handles.insert(task, handle.clone());
        handle
    }
}

/// A fake executor that runs each job synchronously inside `dispatch` and
/// returns an already-resolved handle.
pub struct InlineExecutor<T> {
    dispatched: Arc<Mutex<Vec<TaskId>>>,
    _output: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for InlineExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            dispatched: Arc::clone(&self.dispatched),
            _output: std::marker::PhantomData,
        }
    }
}

impl<T> Default for InlineExecutor<T> {
    fn default() -> Self {
        Self {
            dispatched: Arc::new(Mutex::new(Vec::new())),
            _output: std::marker::PhantomData,
        }
    }
}

impl<T> InlineExecutor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<TaskId> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl<T: Clone + Send + Sync + 'static> ExecutorBackend for InlineExecutor<T> {
    type Payload = Job<T>;
    type Output = T;

    fn dispatch(&self, task: TaskId, payload: Job<T>) -> ResultHandle<T> {
        self.dispatched.lock().unwrap().push(task);
        match payload() {
            Ok(value) => ResultHandle::resolved_with(value),
            Err(err) => ResultHandle::failed_with(err),
        }
    }
}
