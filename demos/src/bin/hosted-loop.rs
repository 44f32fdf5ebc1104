use aioswarm::prelude::*;
use clap::Parser;
use std::thread;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version = "0.1")]
struct Cli {
    /// Number of users to run on the hosted loop.
    #[arg(short, long, default_value_t = 5)]
    users: usize,

    /// How long the host keeps the loop alive.
    #[arg(short, long, default_value = "3s", value_parser = humantime::parse_duration)]
    wait: Duration,
}

struct Poller {
    environment: Environment,
}

impl User for Poller {
    fn new(environment: &Environment) -> Self {
        Self {
            environment: environment.clone(),
        }
    }

    fn environment(&self) -> Option<&Environment> {
        Some(&self.environment)
    }

    fn tasks() -> Vec<Task<Self>> {
        tasks![poll]
    }
}

#[task]
async fn poll(ctx: Context<Poller>) {
    debug!("{} polling", ctx.id());
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("aioswarm=debug,hosted_loop=debug")
        .init();

    let args = Cli::parse();
    let hosted = HostedEventLoop::new();
    let shutdown = hosted.shutdown_token();

    // Stands in for the host deciding when the test is over.
    let host = thread::spawn(move || {
        thread::sleep(args.wait);
        shutdown.cancel();
    });

    let shutdown = hosted.shutdown_token();
    let report = hosted.run_until(async move {
        let config = RunnerConfig::new().task_wait(Duration::from_millis(500));
        let mut runner = WorkerRunner::new(Environment::single::<Poller>(config));
        runner.spawn("Poller", args.users)?;
        shutdown.cancelled().await;
        Ok::<_, anyhow::Error>(runner.stop_all().await)
    })??;

    host.join().map_err(|_| anyhow::anyhow!("host shutdown thread panicked"))?;
    info!("Hosted loop stopped {} users", report.stopped);
    Ok(())
}
