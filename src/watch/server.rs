//! Process setup and the periodic check loop

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::Context;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::notify::notifier::{Envelope, Notifier};
use crate::notify::sendgrid::SendGridTransport;
use crate::parser::fetcher::HttpManifestFetcher;
use crate::parser::package_json::PackageJsonParser;
use crate::version::ledger::Ledger;
use crate::version::registries::npm::NpmRegistry;
use crate::watch::orchestrator::{CycleReport, Orchestrator};

/// Install the global tracing subscriber.
///
/// Logs go to stderr unless `log_file` is set. The returned guard must be
/// kept alive for buffered file output to be flushed.
pub fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = &config.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {:?}", log_path))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

/// Open the ledger, creating its directory if needed
pub fn open_ledger(config: &Config) -> anyhow::Result<Ledger> {
    if let Some(parent) = config.ledger_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating ledger directory {:?}", parent))?;
    }

    Ledger::new(&config.ledger_path)
        .with_context(|| format!("opening ledger {:?}", config.ledger_path))
}

/// Wire the production collaborators into an orchestrator
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let fetcher = HttpManifestFetcher::new(config.fetch_timeout)?;
    let registry = NpmRegistry::new(&config.registry_url, config.fetch_timeout)?;
    let transport = SendGridTransport::new(
        &config.sendgrid_url,
        &config.sendgrid_key,
        config.fetch_timeout,
    )?;
    let ledger = open_ledger(config)?;

    let notifier = Notifier::new(
        Arc::new(transport),
        Envelope {
            from_email: config.sender_email.clone(),
            from_name: config.sender_name.clone(),
            to: config.recipients.clone(),
        },
    );

    Ok(Orchestrator::new(
        Arc::new(fetcher),
        Arc::new(PackageJsonParser::new()),
        Arc::new(registry),
        Arc::new(ledger),
        Arc::new(notifier),
        config.minor_dependencies.clone(),
        config.max_concurrent_fetches,
    ))
}

/// Run a single check cycle
pub async fn run_once(config: &Config) -> anyhow::Result<CycleReport> {
    let orchestrator = build_orchestrator(config)?;
    Ok(orchestrator.run_cycle(&config.manifest_urls).await)
}

/// Run a check cycle immediately and then once per configured interval, forever
pub async fn run_daemon(config: &Config) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    info!(
        "Watching {} manifests every {:?}",
        config.manifest_urls.len(),
        config.check_interval
    );
    if config.manifest_urls.is_empty() {
        warn!("MANIFEST_URLS is empty");
    }

    let mut ticker = interval(config.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        orchestrator.run_cycle(&config.manifest_urls).await;
    }
}
