mod utils;
#[allow(unused)]
use utils::*;

use aioswarm::error::{SpawnError, StopError, UserError};
use aioswarm::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[tracing_test::traced_test]
#[tokio::test]
#[ntest::timeout(10_000)]
async fn spawn_wait_stop_one() {
    let mut runner = WorkerRunner::new(Environment::single::<Visitor>(fast_config()));

    let spawned = runner.spawn("Visitor", 10).unwrap();
    assert_eq!(spawned.len(), 10);
    assert_eq!(runner.user_count_of("Visitor"), 10);
    assert_eq!(runner.running_count(), 10);

    tokio::time::sleep(UNIT * 2).await;
    let report = runner.stop("Visitor", 1).await.unwrap();
    assert_eq!(report.stopped, 1);
    assert!(report.is_clean());

    tokio::time::sleep(UNIT * 2).await;
    assert_eq!(runner.user_count_of("Visitor"), 9);
    assert_eq!(runner.running_count(), 9);

    let stopped = &spawned[9];
    assert!(stopped.is_cancelled());
    assert!(!stopped.is_running());
    assert!(spawned[..9].iter().all(UserRef::is_running));
    assert!(spawned.iter().all(|user| user.stats().success >= 1));

    assert!(logs_contain("10 new users spawned"));
    assert!(logs_contain("inside task"));
    assert!(logs_contain("cancelled"));
    assert!(logs_contain("stopped"));

    let report = runner.stop_all().await;
    assert_eq!(report.stopped, 9);
    assert_eq!(runner.user_count(), 0);
    assert_eq!(runner.running_count(), 0);
    assert!(spawned.iter().all(|user| !user.is_running()));
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn tasks_have_run() {
    static HAS_RUN: AtomicBool = AtomicBool::new(false);

    struct Marker {
        environment: Environment,
    }

    impl User for Marker {
        fn new(environment: &Environment) -> Self {
            Self {
                environment: environment.clone(),
            }
        }

        fn environment(&self) -> Option<&Environment> {
            Some(&self.environment)
        }

        fn tasks() -> Vec<Task<Self>> {
            tasks![mark]
        }
    }

    #[task]
    async fn mark(_ctx: Context<Marker>) {
        HAS_RUN.store(true, Ordering::SeqCst);
        tokio::time::sleep(UNIT).await;
    }

    let mut runner = WorkerRunner::new(Environment::single::<Marker>(fast_config()));
    runner.spawn_users([("Marker", 10)]).unwrap();
    tokio::time::sleep(UNIT * 2).await;
    assert!(HAS_RUN.load(Ordering::SeqCst));

    let report = runner.stop_all().await;
    assert_eq!(report.stopped, 10);
    assert!(runner.user_classes_count().is_empty());
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn failing_task_surfaces_on_stop() {
    struct Checkout {
        environment: Environment,
    }

    impl User for Checkout {
        fn new(environment: &Environment) -> Self {
            Self {
                environment: environment.clone(),
            }
        }

        fn environment(&self) -> Option<&Environment> {
            Some(&self.environment)
        }

        fn tasks() -> Vec<Task<Self>> {
            tasks![add_to_cart, pay]
        }
    }

    #[task]
    async fn add_to_cart(_ctx: Context<Checkout>) -> anyhow::Result<()> {
        Ok(())
    }

    #[task]
    async fn pay(_ctx: Context<Checkout>) -> anyhow::Result<()> {
        let code: u16 = "502".parse()?;
        anyhow::bail!("payment gateway returned {code}")
    }

    let environment = Environment::with_config(
        [UserClass::of::<Checkout>(), UserClass::of::<Visitor>()],
        fast_config(),
    );
    let mut runner = WorkerRunner::new(environment);
    let checkout = runner.spawn("Checkout", 1).unwrap().remove(0);
    let visitors = runner.spawn("Visitor", 2).unwrap();

    while checkout.is_running() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(checkout.stats().success, 1);
    assert_eq!(checkout.stats().error, 1);
    assert!(visitors.iter().all(UserRef::is_running));

    let mut report = runner.stop_all().await;
    assert_eq!(report.stopped, 3);
    assert_eq!(report.errors.len(), 1);

    let (id, err) = report.errors.remove(0);
    assert_eq!(id, checkout.id());
    match err {
        UserError::Task { task, source } => {
            assert_eq!(task, "pay");
            assert_eq!(source.to_string(), "payment gateway returned 502");
        }
        other => panic!("Unexpected error: {other}"),
    }
}

#[tokio::test]
async fn user_without_tasks_fails_immediately() {
    struct Empty {
        environment: Environment,
    }

    impl User for Empty {
        fn new(environment: &Environment) -> Self {
            Self {
                environment: environment.clone(),
            }
        }

        fn environment(&self) -> Option<&Environment> {
            Some(&self.environment)
        }

        fn tasks() -> Vec<Task<Self>> {
            tasks![]
        }
    }

    let mut runner = WorkerRunner::new(Environment::single::<Empty>(fast_config()));
    let err = runner.spawn("Empty", 3).unwrap_err();
    assert!(matches!(err, SpawnError::NoTasks { class: "Empty" }));
    assert_eq!(runner.user_count(), 0);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn stop_more_than_running() {
    let mut runner = WorkerRunner::new(Environment::single::<Visitor>(fast_config()));
    runner.spawn("Visitor", 2).unwrap();

    let err = runner.stop("Visitor", 5).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot stop 5 users of class 'Visitor'; only 2 present."
    );
    assert!(matches!(err, StopError::NotEnoughUsers { .. }));
    assert_eq!(runner.running_count(), 2);

    runner.stop_all().await;
}

#[test]
fn config_round_trip() {
    let config = fast_config().spawn_log_interval(50);
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["task_wait"], 10);
    assert_eq!(json["spawn_log_interval"], 50);

    let parsed: RunnerConfig = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, config);
}
