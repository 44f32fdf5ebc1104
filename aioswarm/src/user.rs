//! User definitions and the handles the runner keeps for spawned users.
use crate::context::{Context, UserId};
use crate::environment::Environment;
use crate::error::{SpawnError, UserError};
use crate::task::Task;
use crate::user_loop::UserLoop;
use aioswarm_core::{UserStats, DEFAULT_USER_WEIGHT};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, debug_span, error, info, trace, warn, Instrument};

/// A simulated user, executing its tasks in order until stopped.
///
/// # Example
/// ```ignore
/// use aioswarm::prelude::*;
///
/// struct MyUser {
///     environment: Environment,
/// }
///
/// impl User for MyUser {
///     fn new(environment: &Environment) -> Self {
///         Self {
///             environment: environment.clone(),
///         }
///     }
///
///     fn environment(&self) -> Option<&Environment> {
///         Some(&self.environment)
///     }
///
///     fn tasks() -> Vec<Task<Self>> {
///         tasks![browse]
///     }
/// }
///
/// #[task]
/// async fn browse(ctx: Context<MyUser>) {
///     ctx.sleep(Duration::from_millis(100)).await;
/// }
/// ```
pub trait User: Send + Sync + Sized + 'static {
    /// Relative share of users this class gets from [`WorkerRunner::spawn_weighted`](crate::WorkerRunner::spawn_weighted).
    const WEIGHT: u32 = DEFAULT_USER_WEIGHT;

    fn new(environment: &Environment) -> Self;

    /// The environment the user was constructed with.
    fn environment(&self) -> Option<&Environment>;

    /// The ordered list of tasks run on every iteration. Must not be empty.
    fn tasks() -> Vec<Task<Self>>;

    /// Name used to register and look up the class. Defaults to the type name without its path.
    fn name() -> &'static str {
        short_type_name::<Self>()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

type Launcher = fn(&Environment, &Handle) -> Result<UserHandle, SpawnError>;

/// Type-erased user class, as registered in an [`Environment`].
#[derive(Copy, Clone)]
pub struct UserClass {
    name: &'static str,
    weight: u32,
    launch: Launcher,
}

impl UserClass {
    pub fn of<U: User>() -> Self {
        Self {
            name: U::name(),
            weight: U::WEIGHT,
            launch: launch::<U>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub(crate) fn launch(
        &self,
        environment: &Environment,
        runtime: &Handle,
    ) -> Result<UserHandle, SpawnError> {
        (self.launch)(environment, runtime)
    }
}

impl fmt::Debug for UserClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClass")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

fn launch<U: User>(environment: &Environment, runtime: &Handle) -> Result<UserHandle, SpawnError> {
    let class = U::name();
    let user = U::new(environment);
    if user.environment().is_none() {
        return Err(SpawnError::MissingEnvironment { class });
    }

    let tasks = U::tasks();
    if tasks.is_empty() {
        error!("User class {class} has no tasks defined.");
        return Err(SpawnError::NoTasks { class });
    }

    let id = UserId::next();
    let token = CancellationToken::new();
    let state = Arc::new(UserState::new());
    let ctx = Context::new(id, Arc::new(user), environment.clone(), token.clone());
    let user_loop = UserLoop::new(class, tasks, environment.config().task_wait);

    let join = runtime.spawn(
        user_loop
            .run(ctx, state.clone())
            .instrument(debug_span!("user", class, id = %id)),
    );

    Ok(UserHandle {
        user: UserRef {
            id,
            class,
            token,
            state,
        },
        join,
    })
}

/// Shared counters for a single user. Written by the user's loop, read through [`UserRef`].
#[derive(Debug)]
pub(crate) struct UserState {
    pub running: AtomicBool,
    pub iterations: AtomicU64,
    pub success: AtomicU64,
    pub error: AtomicU64,
}

impl UserState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            iterations: AtomicU64::new(0),
            success: AtomicU64::new(0),
            error: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            iterations: self.iterations.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable view onto a spawned user.
#[derive(Debug, Clone)]
pub struct UserRef {
    id: UserId,
    class: &'static str,
    token: CancellationToken,
    state: Arc<UserState>,
}

impl UserRef {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Whether the user's loop is still alive. Turns `false` once the loop has exited, for
    /// whatever reason.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Whether the user has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn stats(&self) -> UserStats {
        self.state.stats()
    }
}

/// Owning handle kept in the runner's pool.
pub(crate) struct UserHandle {
    user: UserRef,
    join: JoinHandle<Result<(), UserError>>,
}

impl UserHandle {
    pub fn user(&self) -> &UserRef {
        &self.user
    }

    pub fn cancel(&self) {
        self.user.token.cancel();
    }

    /// Waits for the loop to exit, surfacing the error it ended with, if any.
    pub async fn join(self) -> Result<(), UserError> {
        match self.join.await {
            Ok(res) => res,
            Err(err) if err.is_panic() => Err(UserError::Panicked),
            Err(_) => Ok(()),
        }
    }
}
