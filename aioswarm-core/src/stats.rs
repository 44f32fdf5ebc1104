use std::fmt;

/// Point-in-time counters for a single user.
///
/// An iteration is one full pass over the user's task list.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub iterations: u64,
    pub success: u64,
    pub error: u64,
}

impl UserStats {
    /// Total number of task invocations which completed, successfully or not.
    pub fn tasks_run(&self) -> u64 {
        self.success + self.error
    }

    pub fn error_rate(&self) -> f64 {
        match self.tasks_run() {
            0 => 0.,
            total => self.error as f64 / total as f64,
        }
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Iterations={}, Success={}, Error={}, ErrorRate={:.2}",
            self.iterations,
            self.success,
            self.error,
            self.error_rate(),
        )
    }
}
