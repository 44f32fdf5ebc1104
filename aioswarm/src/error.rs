use crate::task::TaskError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("No user class named '{0}' is registered in the environment.")]
    UnknownUserClass(String),

    #[error("Users can only be spawned from within a Tokio runtime.")]
    NoRuntime,

    #[error("Environment is missing on user '{class}'. Perhaps `User::new` does not store the environment it is given, or `User::environment` returns `None`?")]
    MissingEnvironment { class: &'static str },

    #[error("User '{class}' has no tasks. You forgot to define any tasks.")]
    NoTasks { class: &'static str },
}

#[derive(Debug, Error)]
pub enum StopError {
    #[error("Cannot stop {requested} users of class '{class}'; only {running} present.")]
    NotEnoughUsers {
        class: String,
        requested: usize,
        running: usize,
    },
}

/// Reason a user's loop ended other than being cancelled.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("You forgot to define any tasks.")]
    NoTasks,

    #[error("Task '{task}' failed: {source}")]
    Task {
        task: &'static str,
        source: TaskError,
    },

    #[error("User loop panicked.")]
    Panicked,
}

#[derive(Debug, Error)]
pub enum HostedError {
    #[error("Failed to build the hosted runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to spawn a host execution unit: {0}")]
    Spawn(std::io::Error),

    #[error("Host execution unit panicked.")]
    HostPanicked,

    #[error("Hosted future never produced a value.")]
    Incomplete,
}
