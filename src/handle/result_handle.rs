// src/handle/result_handle.rs

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::trace;

use crate::errors::{DataflowError, Result, TaskError};
use crate::handle::Outcome;
use crate::handle::trampoline::{Callback, run_callbacks};
use crate::types::HandleId;

type ResolveCallback<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;

enum Slot<T> {
    Unresolved(Vec<ResolveCallback<T>>),
    Settled(Outcome<T>),
}

struct Inner<T> {
    id: HandleId,
    slot: Mutex<Slot<T>>,
    /// Wakes threads blocked in `wait` / `wait_timeout`.
    cond: Condvar,
    /// Wakes async tasks suspended in `resolved`.
    notify: Notify,
}

/// A write-once container for a value or an error.
///
/// Cloning a `ResultHandle` yields another reference to the same slot; every
/// clone observes the single assignment. Readers may poll ([`is_done`],
/// [`try_outcome`]), block ([`wait`]), or suspend ([`resolved`]).
///
/// [`is_done`]: ResultHandle::is_done
/// [`try_outcome`]: ResultHandle::try_outcome
/// [`wait`]: ResultHandle::wait
/// [`resolved`]: ResultHandle::resolved
pub struct ResultHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("id", &self.inner.id)
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T> ResultHandle<T> {
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// Non-blocking: has this handle been completed or failed?
    pub fn is_done(&self) -> bool {
        matches!(*self.lock(), Slot::Settled(_))
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // Callbacks never run under this lock, so a poisoned slot still
        // holds consistent data.
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> ResultHandle<T> {
    /// Create an unresolved handle.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: HandleId::next(),
                slot: Mutex::new(Slot::Unresolved(Vec::new())),
                cond: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Create a handle that is already resolved with `value`.
    pub fn resolved_with(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// Create a handle that has already failed with `error`.
    pub fn failed_with(error: TaskError) -> Self {
        Self::settled(Err(error))
    }

    fn settled(outcome: Outcome<T>) -> Self {
        let handle = Self::new();
        *handle.lock() = Slot::Settled(outcome);
        handle
    }

    /// Resolve the handle with a value.
    ///
    /// Fails with [`DataflowError::AlreadyResolved`] if the handle was
    /// already completed or failed; the stored outcome is left untouched.
    pub fn complete(&self, value: T) -> Result<()> {
        self.settle(Ok(value))
    }

    /// Resolve the handle with an error. Same exclusivity as [`complete`].
    ///
    /// [`complete`]: ResultHandle::complete
    pub fn fail(&self, error: TaskError) -> Result<()> {
        self.settle(Err(error))
    }

    /// Resolve with an arbitrary outcome.
    pub fn settle(&self, outcome: Outcome<T>) -> Result<()> {
        let callbacks = {
            let mut slot = self.lock();
            if matches!(*slot, Slot::Settled(_)) {
                return Err(DataflowError::AlreadyResolved(self.inner.id));
            }
            match std::mem::replace(&mut *slot, Slot::Settled(outcome.clone())) {
                Slot::Unresolved(callbacks) => callbacks,
                Slot::Settled(_) => Vec::new(),
            }
        };

        trace!(
            handle = %self.inner.id,
            ok = outcome.is_ok(),
            callbacks = callbacks.len(),
            "handle settled"
        );

        self.inner.cond.notify_all();
        self.inner.notify.notify_waiters();

        run_callbacks(bind_outcome(callbacks, &outcome));
        Ok(())
    }

    /// Non-blocking read of the outcome, if resolved.
    pub fn try_outcome(&self) -> Option<Outcome<T>> {
        match &*self.lock() {
            Slot::Settled(outcome) => Some(outcome.clone()),
            Slot::Unresolved(_) => None,
        }
    }

    /// Block the calling thread until the handle resolves.
    pub fn wait(&self) -> Outcome<T> {
        let mut slot = self.lock();
        loop {
            if let Slot::Settled(outcome) = &*slot {
                return outcome.clone();
            }
            slot = self
                .inner
                .cond
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block for at most `timeout`. Returns `None` if still unresolved.
    ///
    /// Giving up has no effect on the handle or on whoever will resolve it.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let slot = self.lock();
        let (slot, _) = self
            .inner
            .cond
            .wait_timeout_while(slot, timeout, |s| matches!(s, Slot::Unresolved(_)))
            .unwrap_or_else(PoisonError::into_inner);

        match &*slot {
            Slot::Settled(outcome) => Some(outcome.clone()),
            Slot::Unresolved(_) => None,
        }
    }

    /// Suspend the current async task until the handle resolves.
    pub async fn resolved(&self) -> Outcome<T> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a settle in between
            // still wakes us.
            notified.as_mut().enable();

            if let Some(outcome) = self.try_outcome() {
                return outcome;
            }
            notified.await;
        }
    }

    /// Register `callback` to run exactly once with the final outcome.
    ///
    /// If the handle is already resolved the callback runs right away (or is
    /// queued behind the callbacks currently running on this thread).
    pub fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let outcome = {
            let mut slot = self.lock();
            match &mut *slot {
                Slot::Unresolved(callbacks) => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                Slot::Settled(outcome) => outcome.clone(),
            }
        };

        run_callbacks(vec![Box::new(move || callback(&outcome)) as Callback]);
    }
}

impl<T: Clone + Send + 'static> Default for ResultHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_outcome<T: Clone + Send + 'static>(
    callbacks: Vec<ResolveCallback<T>>,
    outcome: &Outcome<T>,
) -> Vec<Callback> {
    callbacks
        .into_iter()
        .map(|callback| {
            let outcome = outcome.clone();
            Box::new(move || callback(&outcome)) as Callback
        })
        .collect()
}
