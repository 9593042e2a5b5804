// src/dag/index.rs

//! Reverse index from a dependency handle to the tasks waiting on it.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{HandleId, TaskId};

#[derive(Debug, Default)]
pub struct DependencyIndex {
    waiters: HashMap<HandleId, HashSet<TaskId>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` as waiting on `handle`.
    ///
    /// Returns `true` if this created the entry for `handle`, i.e. nobody was
    /// waiting on it before and the caller must start watching the handle.
    pub fn insert(&mut self, handle: HandleId, task: TaskId) -> bool {
        let mut created = false;
        self.waiters
            .entry(handle)
            .or_insert_with(|| {
                created = true;
                HashSet::new()
            })
            .insert(task);
        created
    }

    /// Remove and return every task waiting on `handle`.
    ///
    /// Taking the whole entry is what makes a repeated resolution of the same
    /// handle a no-op.
    pub fn take(&mut self, handle: HandleId) -> Option<HashSet<TaskId>> {
        self.waiters.remove(&handle)
    }

    /// Drop `task` from the entries of the given handles, removing entries
    /// left empty.
    pub fn remove_task(&mut self, task: TaskId, handles: impl IntoIterator<Item = HandleId>) {
        for handle in handles {
            if let Some(set) = self.waiters.get_mut(&handle) {
                set.remove(&task);
                if set.is_empty() {
                    self.waiters.remove(&handle);
                }
            }
        }
    }

    pub fn waiters_of(&self, handle: HandleId) -> Option<&HashSet<TaskId>> {
        self.waiters.get(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Ordered copy for diagnostics.
    pub fn to_sorted(&self) -> BTreeMap<HandleId, Vec<TaskId>> {
        self.waiters
            .iter()
            .map(|(handle, tasks)| {
                let mut tasks: Vec<TaskId> = tasks.iter().copied().collect();
                tasks.sort();
                (*handle, tasks)
            })
            .collect()
    }
}
