use crate::context::Context;
use crate::error::UserError;
use crate::task::{task_hook, Task, TaskLabels};
use crate::user::UserState;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// The loop every spawned user runs.
pub(crate) struct UserLoop<U> {
    class: &'static str,
    tasks: Vec<Task<U>>,
    wait: Duration,
}

impl<U> UserLoop<U>
where
    U: Send + Sync + 'static,
{
    pub fn new(class: &'static str, tasks: Vec<Task<U>>, wait: Duration) -> Self {
        Self { class, tasks, wait }
    }

    /// Runs every task in order, waiting `wait` after each, until the context is cancelled.
    ///
    /// Cancellation is observed at every await point and ends the loop with `Ok(())`. The first
    /// task error ends the loop and is returned as is.
    ///
    /// The exit guard is built before the returned future is first polled, so the running flag
    /// is cleared even when the future is dropped unpolled (e.g. on runtime shutdown).
    ///
    /// `launch` already rejects empty task lists; the check here covers loops built directly.
    pub fn run(
        self,
        ctx: Context<U>,
        state: Arc<UserState>,
    ) -> impl Future<Output = Result<(), UserError>> + Send + 'static {
        let guard = ExitGuard(state.clone());
        async move {
            let _guard = guard;
            self.run_tasks(ctx, state).await
        }
    }

    async fn run_tasks(self, ctx: Context<U>, state: Arc<UserState>) -> Result<(), UserError> {
        if self.tasks.is_empty() {
            error!("You forgot to define any tasks :(");
            return Err(UserError::NoTasks);
        }

        let token = ctx.cancellation_token().clone();
        loop {
            for task in self.tasks.iter() {
                let labels = TaskLabels {
                    class: self.class,
                    task: task.name(),
                };

                let res = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("cancelled");
                        return Ok(());
                    }
                    res = task_hook(labels, &state, task.call(ctx.clone())) => res,
                };

                if let Err(source) = res {
                    error!("Task {} failed: {source}", task.name());
                    return Err(UserError::Task {
                        task: task.name(),
                        source,
                    });
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("cancelled");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(self.wait) => {}
                }
            }
            state.iterations.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Cleanup that runs however the loop exits, including when its task is aborted.
struct ExitGuard(Arc<UserState>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        debug!("stopped");
    }
}
