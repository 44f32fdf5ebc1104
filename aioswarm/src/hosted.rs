//! Hosted event loop
//!
//! Runs a single-threaded Tokio executor inside an execution unit owned by a host scheduler, so
//! async users can live next to work the host schedules itself. The blocking `run_forever` step is
//! handed to the host as a unit of work, and the caller joins on it.
use crate::error::HostedError;
use std::future::Future;
use std::sync::mpsc;
use std::thread;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

const DEFAULT_UNIT_NAME: &str = "aioswarm-hosted";

/// The host's facility for spawning execution units.
pub trait HostScheduler {
    type Unit: HostUnit;

    fn spawn<F>(&self, name: &str, work: F) -> Result<Self::Unit, HostedError>
    where
        F: FnOnce() + Send + 'static;
}

/// A spawned execution unit which can be waited on.
pub trait HostUnit {
    fn join(self) -> Result<(), HostedError>;
}

/// Default host scheduler: every unit is a named OS thread.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadScheduler;

impl HostScheduler for ThreadScheduler {
    type Unit = thread::JoinHandle<()>;

    fn spawn<F>(&self, name: &str, work: F) -> Result<Self::Unit, HostedError>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(work)
            .map_err(HostedError::Spawn)
    }
}

impl HostUnit for thread::JoinHandle<()> {
    fn join(self) -> Result<(), HostedError> {
        thread::JoinHandle::join(self).map_err(|_| HostedError::HostPanicked)
    }
}

/// An async event loop whose blocking steps run on a host scheduler.
///
/// # Example
/// ```ignore
/// use aioswarm::hosted::HostedEventLoop;
///
/// let hosted = HostedEventLoop::new();
/// let stats = hosted.run_until(async move {
///     let mut runner = WorkerRunner::new(environment);
///     runner.spawn("MyUser", 10)?;
///     tokio::time::sleep(Duration::from_secs(2)).await;
///     Ok::<_, SpawnError>(runner.stop_all().await)
/// })?;
/// ```
pub struct HostedEventLoop<S = ThreadScheduler> {
    scheduler: S,
    shutdown: CancellationToken,
    name: String,
}

impl HostedEventLoop<ThreadScheduler> {
    pub fn new() -> Self {
        Self::with_scheduler(ThreadScheduler)
    }
}

impl Default for HostedEventLoop<ThreadScheduler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: HostScheduler> HostedEventLoop<S> {
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            scheduler,
            shutdown: CancellationToken::new(),
            name: DEFAULT_UNIT_NAME.to_string(),
        }
    }

    /// Name given to the execution units spawned on the host.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Token which ends [`run_forever`](Self::run_forever) once cancelled. Clone it into whatever
    /// needs to shut the loop down, on either side of the host boundary.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Runs the event loop on the host until shutdown is requested.
    pub fn run_forever(&self) -> Result<(), HostedError> {
        let shutdown = self.shutdown.clone();
        self.run_until(async move { shutdown.cancelled().await })
    }

    /// Runs `fut` to completion on the hosted event loop and returns its output.
    pub fn run_until<F>(&self, fut: F) -> Result<F::Output, HostedError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();
        let span = info_span!("hosted", name = %self.name);

        debug!("Handing event loop to host unit {}", self.name);
        let unit = self.scheduler.spawn(&self.name, move || {
            let output = runtime.block_on(fut.instrument(span));
            let _ = tx.send(output);
        })?;
        unit.join()?;
        debug!("Host unit {} finished", self.name);

        rx.try_recv().map_err(|_| HostedError::Incomplete)
    }
}
