use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

use depwatch::config::{Config, ledger_path_from_env};
use depwatch::version::ledger::{Ledger, NotificationStore};
use depwatch::watch::server;

#[derive(Parser)]
#[command(name = "depwatch")]
#[command(
    version,
    about = "Emails once when a watched dependency gets a new major (or minor) release"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single check cycle and exit
    Check,
    /// Show what the ledger knows about a dependency
    Status {
        /// Dependency name as declared in the manifest
        dependency: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let (config, _guard) = load_config()?;
            runtime()?.block_on(server::run_daemon(&config))
        }
        Some(Command::Check) => {
            let (config, _guard) = load_config()?;
            runtime()?.block_on(server::run_once(&config))?;
            Ok(())
        }
        Some(Command::Status { dependency }) => print_status(&dependency),
    }
}

/// Read the configuration and install logging; the guard flushes file logs on drop
fn load_config() -> anyhow::Result<(Config, Option<WorkerGuard>)> {
    let config = Config::from_env()?;
    let guard = server::init_tracing(&config)?;
    Ok((config, guard))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn print_status(dependency: &str) -> anyhow::Result<()> {
    let path = ledger_path_from_env();
    let ledger = Ledger::new(&path).with_context(|| format!("opening ledger {:?}", path))?;

    match ledger.get_declared_version(dependency)? {
        Some(version) => println!("{dependency}: last declared {version}"),
        None => println!("{dependency}: never seen in a manifest"),
    }

    let notified = ledger.notified_versions(dependency)?;
    if notified.is_empty() {
        println!("no notifications sent");
    } else {
        println!("notified for: {}", notified.join(", "));
    }

    Ok(())
}
