use aioswarm::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_env_filter("aioswarm=debug")
            .try_init();
    });
}

/// Runner settings with a short wait so a "time unit" is milliseconds, not seconds.
#[allow(unused)]
pub fn fast_config() -> RunnerConfig {
    RunnerConfig::new().task_wait(Duration::from_millis(10))
}

/// Wait unit matching [`fast_config`].
#[allow(unused)]
pub const UNIT: Duration = Duration::from_millis(10);

#[allow(unused)]
pub struct Visitor {
    environment: Environment,
    pub visits: AtomicUsize,
}

impl User for Visitor {
    fn new(environment: &Environment) -> Self {
        Self {
            environment: environment.clone(),
            visits: AtomicUsize::new(0),
        }
    }

    fn environment(&self) -> Option<&Environment> {
        Some(&self.environment)
    }

    fn tasks() -> Vec<Task<Self>> {
        tasks![task_1]
    }
}

#[task]
async fn task_1(ctx: Context<Visitor>) {
    tracing::debug!("inside task");
    ctx.visits.fetch_add(1, Ordering::Relaxed);
    ctx.sleep(UNIT).await;
}
