// src/handle/dependency.rs

use std::fmt;
use std::sync::Arc;

use crate::handle::ResultHandle;
use crate::types::HandleId;

/// The part of a handle a waiting task needs: identity, a done check, and a
/// way to hear about resolution. Independent of the value type.
trait Watchable: Send + Sync {
    fn id(&self) -> HandleId;
    fn is_done(&self) -> bool;
    fn subscribe(&self, callback: Box<dyn FnOnce() + Send>);
}

impl<T: Clone + Send + 'static> Watchable for ResultHandle<T> {
    fn id(&self) -> HandleId {
        ResultHandle::id(self)
    }

    fn is_done(&self) -> bool {
        ResultHandle::is_done(self)
    }

    fn subscribe(&self, callback: Box<dyn FnOnce() + Send>) {
        self.on_resolved(move |_| callback());
    }
}

/// A type-erased reference to a [`ResultHandle`] that a task waits on.
///
/// Built with `Dependency::from(&handle)`; any value type works, so results
/// from unrelated subsystems can gate a task just like results produced by
/// the scheduler itself.
#[derive(Clone)]
pub struct Dependency {
    handle: Arc<dyn Watchable>,
}

impl Dependency {
    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn is_done(&self) -> bool {
        self.handle.is_done()
    }

    /// Run `callback` once the underlying handle resolves.
    pub(crate) fn subscribe(&self, callback: Box<dyn FnOnce() + Send>) {
        self.handle.subscribe(callback)
    }
}

impl<T: Clone + Send + 'static> From<ResultHandle<T>> for Dependency {
    fn from(handle: ResultHandle<T>) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }
}

impl<T: Clone + Send + 'static> From<&ResultHandle<T>> for Dependency {
    fn from(handle: &ResultHandle<T>) -> Self {
        Self::from(handle.clone())
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.id())
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T: Clone + Send + 'static> ResultHandle<T> {
    /// Shorthand for `Dependency::from(self)`.
    pub fn as_dependency(&self) -> Dependency {
        Dependency::from(self)
    }
}
