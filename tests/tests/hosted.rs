mod utils;
#[allow(unused)]
use utils::*;

use aioswarm::error::SpawnError;
use aioswarm::hosted::{HostScheduler, HostUnit, ThreadScheduler};
use aioswarm::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
#[ntest::timeout(10_000)]
fn runner_inside_hosted_loop() {
    init();

    let hosted = HostedEventLoop::new().name("host-runner");
    let report = hosted
        .run_until(async move {
            let mut runner = WorkerRunner::new(Environment::single::<Visitor>(fast_config()));
            let spawned = runner.spawn("Visitor", 4)?;
            tokio::time::sleep(UNIT * 3).await;

            let visits: u64 = spawned.iter().map(|user| user.stats().success).sum();
            let report = runner.stop_all().await;
            Ok::<_, SpawnError>((visits, report))
        })
        .unwrap();

    let (visits, report) = report.unwrap();
    assert!(visits >= 4);
    assert_eq!(report.stopped, 4);
    assert!(report.is_clean());
}

/// Host which runs every unit on a thread, recording how many it handed out.
#[derive(Clone, Default)]
struct RecordingHost {
    units: Arc<AtomicUsize>,
}

struct RecordedUnit(thread::JoinHandle<()>);

impl HostUnit for RecordedUnit {
    fn join(self) -> Result<(), aioswarm::error::HostedError> {
        HostUnit::join(self.0)
    }
}

impl HostScheduler for RecordingHost {
    type Unit = RecordedUnit;

    fn spawn<F>(&self, name: &str, work: F) -> Result<Self::Unit, aioswarm::error::HostedError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.units.fetch_add(1, Ordering::SeqCst);
        ThreadScheduler.spawn(name, work).map(RecordedUnit)
    }
}

#[test]
#[ntest::timeout(10_000)]
fn users_run_until_host_shutdown() {
    init();

    let host = RecordingHost::default();
    let hosted = HostedEventLoop::with_scheduler(host.clone());
    let shutdown = hosted.shutdown_token();

    let runner_loop = {
        let shutdown = shutdown.clone();
        async move {
            let mut runner = WorkerRunner::new(Environment::single::<Visitor>(fast_config()));
            runner.spawn("Visitor", 3).expect("spawn visitors");
            shutdown.cancelled().await;
            runner.stop_all().await.stopped
        }
    };

    let stopper = thread::spawn(move || {
        thread::sleep(UNIT * 5);
        shutdown.cancel();
    });

    let stopped = hosted.run_until(runner_loop).unwrap();
    stopper.join().unwrap();

    assert_eq!(stopped, 3);
    assert_eq!(host.units.load(Ordering::SeqCst), 1);
}

#[test]
#[ntest::timeout(10_000)]
fn users_are_not_running_after_host_teardown() {
    init();

    // The runner and then the runtime go away before any user loop gets polled.
    let hosted = HostedEventLoop::new().name("host-teardown");
    let spawned = hosted
        .run_until(async move {
            let mut runner = WorkerRunner::new(Environment::single::<Visitor>(fast_config()));
            runner.spawn("Visitor", 3)
        })
        .unwrap()
        .unwrap();

    assert_eq!(spawned.len(), 3);
    for user in spawned.iter() {
        assert!(user.is_cancelled());
        assert!(!user.is_running(), "{} still marked running", user.id());
    }
}
