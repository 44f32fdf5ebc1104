//! Worker runner
//!
//! Owns every spawned user, grouped per user class in spawn order. Users are spawned onto the
//! current Tokio runtime and stopped last-in-first-out.
use crate::context::UserId;
use crate::environment::Environment;
use crate::error::{SpawnError, StopError, UserError};
use crate::user::{UserHandle, UserRef};
use futures_util::future::join_all;
use std::collections::HashMap;
use tokio::runtime::Handle;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Outcome of stopping one or more users.
#[derive(Debug, Default)]
pub struct StopReport {
    /// Number of users that were stopped and whose loops have exited.
    pub stopped: usize,
    /// Users whose loop had already ended with an error before it could be stopped.
    pub errors: Vec<(UserId, UserError)>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pool manager for users of the classes registered in an [`Environment`].
///
/// # Example
/// ```ignore
/// use aioswarm::prelude::*;
///
/// #[tokio::main]
/// async fn main() {
///     let mut runner = WorkerRunner::new(Environment::single::<MyUser>(RunnerConfig::new()));
///     runner.spawn("MyUser", 10).unwrap();
///     tokio::time::sleep(Duration::from_secs(2)).await;
///     runner.stop("MyUser", 1).await.unwrap();
///     runner.stop_all().await;
/// }
/// ```
pub struct WorkerRunner {
    environment: Environment,
    users: HashMap<&'static str, Vec<UserHandle>>,
}

impl WorkerRunner {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            users: HashMap::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Spawns `count` users of `user_class` and starts their loops.
    ///
    /// Users spawned before an error remain in the pool.
    #[instrument(skip(self))]
    pub fn spawn(&mut self, user_class: &str, count: usize) -> Result<Vec<UserRef>, SpawnError> {
        let class = *self
            .environment
            .user_class(user_class)
            .ok_or_else(|| SpawnError::UnknownUserClass(user_class.to_string()))?;
        let runtime = Handle::try_current().map_err(|_| SpawnError::NoRuntime)?;

        let mut new_users = Vec::with_capacity(count);
        for n in 1..=count {
            let handle = class.launch(&self.environment, &runtime)?;
            new_users.push(handle.user().clone());
            self.users.entry(class.name()).or_default().push(handle);

            if self.environment.config().log_spawn_progress(n, count) {
                debug!("{n} new users spawned");
            }
        }
        debug!("All users of class {} spawned", class.name());

        self.record_user_gauge(class.name());
        Ok(new_users)
    }

    /// Spawns users for each `(class, count)` pair in order.
    pub fn spawn_users<'a, I>(&mut self, counts: I) -> Result<Vec<UserRef>, SpawnError>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut new_users = vec![];
        for (user_class, count) in counts {
            new_users.extend(self.spawn(user_class, count)?);
        }
        Ok(new_users)
    }

    /// Spawns `total` users spread over every registered class according to class weights.
    pub fn spawn_weighted(&mut self, total: usize) -> Result<Vec<UserRef>, SpawnError> {
        let counts = self.environment.weighted_counts(total);
        self.spawn_users(counts.into_iter().filter(|(_, count)| *count > 0))
    }

    /// Stops the `count` most recently spawned users of `user_class` and waits for them to exit.
    pub async fn stop(&mut self, user_class: &str, count: usize) -> Result<StopReport, StopError> {
        self.stop_users([(user_class, count)]).await
    }

    /// Stops users for each `(class, count)` pair.
    ///
    /// Nothing is stopped unless every class has enough users. All cancellations are issued
    /// before waiting on any of them.
    #[instrument(skip_all)]
    pub async fn stop_users<'a, I>(&mut self, counts: I) -> Result<StopReport, StopError>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let counts: Vec<_> = counts.into_iter().collect();

        let mut requested: HashMap<&str, usize> = HashMap::new();
        for (user_class, count) in counts.iter() {
            *requested.entry(*user_class).or_default() += count;
        }
        for (user_class, requested) in requested {
            let running = self.user_count_of(user_class);
            if running < requested {
                return Err(StopError::NotEnoughUsers {
                    class: user_class.to_string(),
                    requested,
                    running,
                });
            }
        }

        let mut to_stop = vec![];
        for (user_class, count) in counts {
            let Some(class) = self.users.get_key_value(user_class).map(|(class, _)| *class)
            else {
                continue;
            };
            if let Some(list) = self.users.get_mut(class) {
                let keep = list.len() - count;
                to_stop.extend(list.drain(keep..).rev());
            }
            debug!("Stopping {count} users of class {class}");
            self.record_user_gauge(class);
        }

        Ok(stop_handles(to_stop).await)
    }

    /// Stops every user of every class and waits for all of them to exit.
    #[instrument(skip_all)]
    pub async fn stop_all(&mut self) -> StopReport {
        let mut to_stop = vec![];
        let classes: Vec<_> = self.users.keys().copied().collect();
        for class in classes {
            if let Some(list) = self.users.remove(class) {
                to_stop.extend(list.into_iter().rev());
            }
            self.record_user_gauge(class);
        }

        debug!("Stopping all {} users", to_stop.len());
        stop_handles(to_stop).await
    }

    /// Number of users in the pool, across all classes.
    pub fn user_count(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }

    pub fn user_count_of(&self, user_class: &str) -> usize {
        self.users.get(user_class).map_or(0, Vec::len)
    }

    /// Live user count per class. A class emptied by `stop` reports zero; `stop_all` removes
    /// every class, leaving the map empty.
    pub fn user_classes_count(&self) -> HashMap<&'static str, usize> {
        self.users
            .iter()
            .map(|(class, list)| (*class, list.len()))
            .collect()
    }

    /// Number of pooled users whose loops are still running.
    pub fn running_count(&self) -> usize {
        self.users
            .values()
            .flatten()
            .filter(|handle| handle.user().is_running())
            .count()
    }

    /// The users of `user_class`, oldest first.
    pub fn users_of(&self, user_class: &str) -> Vec<UserRef> {
        self.users
            .get(user_class)
            .map(|list| list.iter().map(|handle| handle.user().clone()).collect())
            .unwrap_or_default()
    }

    fn record_user_gauge(&self, _class: &'static str) {
        #[cfg(feature = "metrics")]
        metrics::gauge!("aioswarm_users", "class" => _class).set(self.user_count_of(_class) as f64);
    }
}

impl Drop for WorkerRunner {
    fn drop(&mut self) {
        // Nothing joins these loops after this point.
        for handle in self.users.values().flatten() {
            handle.cancel();
        }
    }
}

async fn stop_handles(handles: Vec<UserHandle>) -> StopReport {
    for handle in handles.iter() {
        handle.cancel();
    }

    let results = join_all(handles.into_iter().map(|handle| async move {
        let id = handle.user().id();
        (id, handle.join().await)
    }))
    .await;

    let mut report = StopReport::default();
    for (id, res) in results {
        report.stopped += 1;
        if let Err(err) = res {
            warn!("User {id} had exited with an error: {err}");
            report.errors.push((id, err));
        }
    }
    report
}
