#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

extern crate self as aioswarm;

mod context;
pub mod environment;
pub mod error;
pub mod hosted;
pub mod runner;
#[doc(hidden)]
pub mod task;
pub mod user;
mod user_loop;

#[macro_use]
#[doc(hidden)]
pub mod macros;

pub use aioswarm_macros::task;
pub use context::{Context, UserId};
pub use environment::Environment;
pub use hosted::HostedEventLoop;
pub use runner::{StopReport, WorkerRunner};
pub use task::{Task, TaskError, TaskFuture};
pub use user::{User, UserClass, UserRef};

pub mod prelude {
    pub use crate::tasks;
    pub use crate::{
        task, Context, Environment, HostedEventLoop, StopReport, Task, User, UserClass, UserRef,
        WorkerRunner,
    };

    pub use aioswarm_core::{RunnerConfig, UserStats};
    pub use std::time::Duration;
}
