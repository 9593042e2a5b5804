// src/exec/task_runner.rs

//! Individual job runner.

use tracing::{debug, error, info, warn};

use crate::errors::TaskError;
use crate::exec::backend::Job;
use crate::handle::Outcome;
use crate::types::TaskId;

/// Run a single job on the blocking pool and turn whatever happens into an
/// [`Outcome`].
///
/// - `Ok(value)` / `Err(TaskError)` from the job pass through unchanged.
/// - A panic inside the job becomes a `TaskError` naming the panic.
/// - A cancelled blocking task becomes a `TaskError` too.
///
/// If the runtime drops the calling future first, nothing is returned; the
/// executor's drop guard fails the handle in that case.
pub async fn run_job<T: Send + 'static>(task: TaskId, job: Job<T>) -> Outcome<T> {
    debug!(task = %task, "starting job");

    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(value)) => {
            info!(task = %task, success = true, "job finished");
            Ok(value)
        }
        Ok(Err(err)) => {
            warn!(task = %task, error = %err, "job returned an error");
            Err(err)
        }
        Err(join_err) if join_err.is_panic() => {
            let message = crate::handle::panic_message(join_err.into_panic().as_ref());
            error!(task = %task, panic = %message, "job panicked");
            Err(TaskError::new(format!("task {task} panicked: {message}")))
        }
        Err(join_err) => {
            warn!(task = %task, error = %join_err, "job was cancelled");
            Err(TaskError::new(format!("task {task} was cancelled: {join_err}")))
        }
    }
}
