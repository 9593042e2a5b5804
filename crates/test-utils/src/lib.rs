//! Shared helpers for `dataflow` integration tests.

pub mod fake_executor;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use dataflow::exec::Job;
use dataflow::TaskError;

pub use fake_executor::{InlineExecutor, ManualExecutor};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). `RUST_LOG` overrides the default `info` filter,
/// e.g. `RUST_LOG=dataflow=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("test future did not finish within 5s")
}

/// Box a closure as an executor job.
pub fn job<T, F>(f: F) -> Job<T>
where
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
{
    Box::new(f)
}
