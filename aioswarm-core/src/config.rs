use crate::{DEFAULT_SPAWN_LOG_INTERVAL, DEFAULT_TASK_WAIT};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationMilliSeconds};
use std::fmt;
use std::time::Duration;

/// Settings shared by every user spawned from an environment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunnerConfig {
    /// Wait after each task, before the next one starts.
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSeconds<u64>"))]
    pub task_wait: Duration,
    /// Log spawn progress every `spawn_log_interval` users. Zero disables the progress lines.
    pub spawn_log_interval: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self {
            task_wait: DEFAULT_TASK_WAIT,
            spawn_log_interval: DEFAULT_SPAWN_LOG_INTERVAL,
        }
    }

    pub fn task_wait(mut self, task_wait: Duration) -> Self {
        self.task_wait = task_wait;
        self
    }

    pub fn spawn_log_interval(mut self, interval: usize) -> Self {
        self.spawn_log_interval = interval;
        self
    }

    /// Whether spawning the `n`th user (1-based) of `total` should be logged.
    pub fn log_spawn_progress(&self, n: usize, total: usize) -> bool {
        n == total || (self.spawn_log_interval > 0 && n % self.spawn_log_interval == 0)
    }
}

impl fmt::Display for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task_wait={}, spawn_log_interval={}",
            humantime::format_duration(self.task_wait),
            self.spawn_log_interval,
        )
    }
}
