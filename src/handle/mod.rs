// src/handle/mod.rs

//! Single-assignment result handles.
//!
//! - [`result_handle`] holds [`ResultHandle`], the write-once container every
//!   task result (and every dependency) flows through.
//! - [`dependency`] erases a handle's value type so that handles of any type,
//!   including ones created outside the scheduler, can be awaited by a task.
//! - [`trampoline`] runs completion callbacks on a per-thread work queue so
//!   that long completion chains never recurse on the stack.

pub mod dependency;
pub mod result_handle;
mod trampoline;

pub use dependency::Dependency;
pub use result_handle::ResultHandle;

pub(crate) use trampoline::panic_message;

use crate::errors::TaskError;

/// Final state of a resolved handle.
pub type Outcome<T> = std::result::Result<T, TaskError>;
