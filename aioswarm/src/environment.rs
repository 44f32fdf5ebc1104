//! Shared environment handed to every user.
use crate::user::{User, UserClass};
use aioswarm_core::RunnerConfig;
use std::sync::Arc;

/// Registry of user classes plus the configuration users are spawned with.
///
/// Cheap to clone; every user holds a copy. Users only ever read from it.
#[derive(Clone, Debug)]
pub struct Environment {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    user_classes: Vec<UserClass>,
    config: RunnerConfig,
}

impl Environment {
    pub fn new<I>(user_classes: I) -> Self
    where
        I: IntoIterator<Item = UserClass>,
    {
        Self::with_config(user_classes, RunnerConfig::default())
    }

    pub fn with_config<I>(user_classes: I, config: RunnerConfig) -> Self
    where
        I: IntoIterator<Item = UserClass>,
    {
        Self {
            inner: Arc::new(Inner {
                user_classes: user_classes.into_iter().collect(),
                config,
            }),
        }
    }

    /// Shorthand for an environment with a single user class.
    pub fn single<U: User>(config: RunnerConfig) -> Self {
        Self::with_config([UserClass::of::<U>()], config)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    pub fn user_classes(&self) -> &[UserClass] {
        &self.inner.user_classes
    }

    /// Looks up a user class by name. The first registered class wins on duplicate names.
    pub fn user_class(&self, name: &str) -> Option<&UserClass> {
        self.inner.user_classes.iter().find(|c| c.name() == name)
    }

    /// Splits `total` users over the registered classes in proportion to their weights.
    ///
    /// Each class gets the floor of its share; whatever is left over is handed out one at a time
    /// in registration order. Classes with a weight of zero get nothing.
    pub fn weighted_counts(&self, total: usize) -> Vec<(&'static str, usize)> {
        let total_weight: u128 = self
            .inner
            .user_classes
            .iter()
            .map(|c| c.weight() as u128)
            .sum();

        if total_weight == 0 {
            return self
                .inner
                .user_classes
                .iter()
                .map(|c| (c.name(), 0))
                .collect();
        }

        let mut counts: Vec<_> = self
            .inner
            .user_classes
            .iter()
            .map(|c| {
                let share = total as u128 * c.weight() as u128 / total_weight;
                (c.name(), share as usize)
            })
            .collect();

        let assigned: usize = counts.iter().map(|(_, n)| n).sum();
        let mut remainder = total - assigned;
        for (class, (_, count)) in self.inner.user_classes.iter().zip(counts.iter_mut()) {
            if remainder == 0 {
                break;
            }
            if class.weight() > 0 {
                *count += 1;
                remainder -= 1;
            }
        }

        counts
    }
}
