// tests/chain.rs

use std::error::Error;
use std::thread;

use dataflow::dag::Scheduler;
use dataflow::{ResultHandle, TaskError, TaskState};
use dataflow_test_utils::{init_tracing, job, InlineExecutor, ManualExecutor};

type TestResult = Result<(), Box<dyn Error>>;

const CHAIN_LEN: usize = 20_000;

/// T0 waits on an external handle, T(i) waits on T(i-1). With an executor
/// that finishes synchronously, resolving the external handle runs the whole
/// chain on one thread. A small stack proves propagation is not recursive.
#[test]
fn long_chain_of_inline_tasks_runs_on_a_small_stack() -> TestResult {
    init_tracing();

    let worker = thread::Builder::new()
        .name("small-stack".to_string())
        .stack_size(256 * 1024)
        .spawn(|| -> Result<(), String> {
            let exec = InlineExecutor::<usize>::new();
            let sched = Scheduler::new(exec.clone());

            let start = ResultHandle::<usize>::new();
            let mut previous = start.clone();
            let mut handles = Vec::with_capacity(CHAIN_LEN);

            for i in 0..CHAIN_LEN {
                let input = previous.clone();
                let step = job(move || {
                    let value = input
                        .try_outcome()
                        .ok_or_else(|| TaskError::new("dependency not resolved"))??;
                    Ok(value + 1)
                });
                let handle = sched
                    .submit(step, [previous.as_dependency()], None)
                    .map_err(|e| format!("submit {i}: {e}"))?;
                previous = handle.clone();
                handles.push(handle);
            }

            if !exec.dispatched().is_empty() || sched.pending_count() != CHAIN_LEN {
                return Err("chain started before its root resolved".to_string());
            }

            start.complete(0).map_err(|e| e.to_string())?;

            let dispatched = exec.dispatched();
            let mut unique = dispatched.clone();
            unique.sort();
            unique.dedup();
            if dispatched.len() != CHAIN_LEN || unique.len() != CHAIN_LEN {
                return Err(format!(
                    "expected {CHAIN_LEN} single dispatches, got {} ({} unique)",
                    dispatched.len(),
                    unique.len()
                ));
            }
            match previous.try_outcome() {
                Some(Ok(v)) if v == CHAIN_LEN => {}
                other => return Err(format!("unexpected tail outcome: {other:?}")),
            }
            if !sched.is_idle() {
                return Err("scheduler not idle after chain".to_string());
            }
            Ok(())
        })?;

    worker
        .join()
        .map_err(|_| "chain worker panicked")??;
    Ok(())
}

#[test]
fn chain_dispatches_one_link_per_completion() -> TestResult {
    let exec = ManualExecutor::<usize, usize>::new();
    let sched = Scheduler::new(exec.clone());

    let mut ids = Vec::new();
    let mut previous: Option<ResultHandle<usize>> = None;
    for i in 0..50 {
        let deps: Vec<_> = previous.iter().map(|h| h.as_dependency()).collect();
        let handle = sched.submit(i, deps, None)?;
        previous = Some(handle);
    }

    // Only the root has no dependencies.
    assert_eq!(exec.dispatched().len(), 1);

    for step in 0..50 {
        let dispatched = exec.dispatched();
        assert_eq!(dispatched.len(), step + 1);
        let current = dispatched[step];
        ids.push(current);
        exec.complete(current, step)?;
        assert_eq!(sched.task_state(current), Some(TaskState::Completed));
    }

    assert_eq!(exec.payloads(), (0..50).collect::<Vec<_>>());
    for id in ids {
        assert_eq!(exec.dispatch_count(id), 1);
    }
    Ok(())
}
