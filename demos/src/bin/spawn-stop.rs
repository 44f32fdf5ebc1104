use aioswarm::prelude::*;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version = "0.1")]
struct Cli {
    /// Number of users to spawn.
    #[arg(short, long, default_value_t = 10)]
    users: usize,

    /// Number of users to stop after the first wait.
    #[arg(short, long, default_value_t = 1)]
    stop: usize,

    /// How long to let the users run before and after stopping some.
    #[arg(short, long, default_value = "2s", value_parser = humantime::parse_duration)]
    wait: Duration,

    /// Wait between two tasks of a user.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    task_wait: Duration,
}

struct MyUser {
    environment: Environment,
}

impl User for MyUser {
    fn new(environment: &Environment) -> Self {
        Self {
            environment: environment.clone(),
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
async fn task_1(ctx: Context<MyUser>) {
    debug!("inside task");
    ctx.sleep(Duration::from_secs(1)).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("aioswarm=debug,spawn_stop=debug")
        .init();

    let args = Cli::parse();
    let config = RunnerConfig::new().task_wait(args.task_wait);
    info!("Running with {config}");
    let mut runner = WorkerRunner::new(Environment::single::<MyUser>(config));

    info!("spawning");
    runner.spawn("MyUser", args.users)?;
    info!("sleeping");
    tokio::time::sleep(args.wait).await;

    info!("stopping some");
    runner.stop("MyUser", args.stop).await?;
    info!("sleeping again");
    tokio::time::sleep(args.wait).await;

    let running = runner.running_count();
    let report = runner.stop_all().await;
    info!(
        "done! {running} users were still running, {} stopped with errors",
        report.errors.len()
    );
    Ok(())
}
