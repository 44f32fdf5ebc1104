//! Task definitions and the hook wrapped around every task invocation.
use crate::context::Context;
use crate::user::UserState;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Error type returned by tasks. Any `std::error::Error` (and `anyhow::Error`) converts into it.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Future produced by a task function.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;

/// A single unit of work a user performs once per loop iteration.
///
/// Usually built with the [`#[task]`](aioswarm_macros::task) attribute and the
/// [`tasks!`](crate::tasks) macro, but any `fn(Context<U>) -> TaskFuture` works.
pub struct Task<U> {
    name: &'static str,
    func: fn(Context<U>) -> TaskFuture,
}

impl<U> Task<U> {
    pub fn new(name: &'static str, func: fn(Context<U>) -> TaskFuture) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, ctx: Context<U>) -> TaskFuture {
        (self.func)(ctx)
    }
}

impl<U> Clone for Task<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Task<U> {}

impl<U> fmt::Debug for Task<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

/// Conversion used by the `#[task]` macro for the return value of the wrapped function. Not
/// intended to be used manually.
#[doc(hidden)]
pub trait IntoTaskResult {
    fn into_task_result(self) -> Result<(), TaskError>;
}

impl IntoTaskResult for () {
    fn into_task_result(self) -> Result<(), TaskError> {
        Ok(())
    }
}

impl<E: Into<TaskError>> IntoTaskResult for Result<(), E> {
    fn into_task_result(self) -> Result<(), TaskError> {
        self.map_err(Into::into)
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TaskLabels {
    pub class: &'static str,
    pub task: &'static str,
}

/// Runs a single task invocation, recording its outcome on the user's counters.
pub(crate) async fn task_hook<F>(labels: TaskLabels, state: &UserState, func: F) -> F::Output
where
    F: Future<Output = Result<(), TaskError>>,
{
    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    metrics::histogram!("aioswarm_task_latency", "class" => labels.class, "task" => labels.task)
        .record(elapsed.as_secs_f64());

    if res.is_ok() {
        state.success.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("aioswarm_task_success", "class" => labels.class, "task" => labels.task)
            .increment(1);
    } else {
        state.error.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("aioswarm_task_error", "class" => labels.class, "task" => labels.task)
            .increment(1);
    }

    trace!(
        class = labels.class,
        task = labels.task,
        ?elapsed,
        ok = res.is_ok(),
        "task finished"
    );
    res
}
