use crate::environment::Environment;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Process-unique id handed out to every spawned user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(u64);

impl UserId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

/// Everything a task gets to work with.
///
/// Derefs to the user itself. The cancellation token is the same one the runner cancels on stop,
/// so long-running task bodies can bail out early with [`Context::cancelled`] or
/// [`Context::sleep`].
pub struct Context<U> {
    id: UserId,
    user: Arc<U>,
    environment: Environment,
    token: CancellationToken,
}

impl<U> Context<U> {
    pub(crate) fn new(
        id: UserId,
        user: Arc<U>,
        environment: Environment,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            user,
            environment,
            token,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn user(&self) -> &Arc<U> {
        &self.user
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the user has been asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Sleeps for `duration` unless the user is stopped first.
    ///
    /// Returns `false` if the sleep was cut short by cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

impl<U> Clone for Context<U> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            user: self.user.clone(),
            environment: self.environment.clone(),
            token: self.token.clone(),
        }
    }
}

impl<U> Deref for Context<U> {
    type Target = U;

    fn deref(&self) -> &U {
        &self.user
    }
}

impl<U> fmt::Debug for Context<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
