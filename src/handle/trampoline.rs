// src/handle/trampoline.rs

//! Per-thread callback queue.
//!
//! Resolving a handle runs its callbacks, and those callbacks commonly
//! resolve further handles (a task finishing completes its result handle,
//! which unblocks a dependent task, whose executor may finish synchronously,
//! and so on). Running them by direct recursion would grow the stack with the
//! length of the chain. Instead, the first resolution on a thread becomes the
//! *owner* of a queue and drains it; nested resolutions only enqueue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

pub(crate) type Callback = Box<dyn FnOnce() + Send>;

thread_local! {
    static QUEUE: RefCell<Option<VecDeque<Callback>>> = const { RefCell::new(None) };
}

/// Run `callbacks` now, or defer them to the drain loop already active on
/// this thread.
pub(crate) fn run_callbacks(callbacks: Vec<Callback>) {
    if callbacks.is_empty() {
        return;
    }

    let owner = QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        let owner = q.is_none();
        q.get_or_insert_with(VecDeque::new).extend(callbacks);
        owner
    });

    if !owner {
        return;
    }

    let _guard = DrainGuard;
    while let Some(callback) = QUEUE.with(|q| q.borrow_mut().as_mut().and_then(VecDeque::pop_front)) {
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            error!(
                panic = %panic_message(panic.as_ref()),
                "handle completion callback panicked"
            );
        }
    }
}

/// Whether the current thread is inside a drain loop (used by tests).
#[cfg(test)]
pub(crate) fn is_draining() -> bool {
    QUEUE.with(|q| q.borrow().is_some())
}

struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        QUEUE.with(|q| *q.borrow_mut() = None);
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn nested_callbacks_are_queued_not_recursed() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let outer_log = Arc::clone(&log);
        let outer: Callback = Box::new(move || {
            outer_log.lock().unwrap().push("outer-start");
            assert!(is_draining());

            let inner_log = Arc::clone(&outer_log);
            let inner: Callback = Box::new(move || {
                inner_log.lock().unwrap().push("inner");
            });
            run_callbacks(vec![inner]);

            // The nested callback only runs once we return to the drain loop.
            outer_log.lock().unwrap().push("outer-end");
        });
        run_callbacks(vec![outer]);

        assert_eq!(*log.lock().unwrap(), vec!["outer-start", "outer-end", "inner"]);
        assert!(!is_draining());
    }

    #[test]
    fn panicking_callback_does_not_drop_the_rest() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);

        fn boom() {
            panic!("boom");
        }

        let callbacks: Vec<Callback> = vec![
            Box::new(boom),
            Box::new(move || *flag.lock().unwrap() = true),
        ];
        run_callbacks(callbacks);

        assert!(*ran.lock().unwrap());
        assert!(!is_draining());
    }
}
