use std::time::Duration;

/// How long a user waits after each task before running the next one.
pub const DEFAULT_TASK_WAIT: Duration = Duration::from_secs(1);

/// The runner logs spawn progress every this many users.
pub const DEFAULT_SPAWN_LOG_INTERVAL: usize = 10;

/// Weight given to a user class which does not declare one.
pub const DEFAULT_USER_WEIGHT: u32 = 1;
