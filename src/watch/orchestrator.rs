//! Check cycle: manifests → declared versions → upstream versions → notifications
//!
//! Every manifest and every dependency inside it is checked concurrently.
//! Failures are logged and counted at the dependency (or manifest) where they
//! happen and never abort the rest of the cycle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::FETCH_STAGGER_DELAY_MS;
use crate::notify::error::DispatchError;
use crate::notify::notifier::{Notifier, UpdateNotice};
use crate::parser::traits::{ManifestFetcher, ParseError, Parser};
use crate::parser::types::DeclaredDependency;
use crate::version::checker::classify;
use crate::version::error::{FetchError, LedgerError};
use crate::version::ledger::NotificationStore;
use crate::version::registry::Registry;
use crate::version::semver::{SemanticVersion, parse_version};

/// Error that stops the check of one dependency or one manifest
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Ledger failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Worker pool closed")]
    PoolClosed,
}

/// What happened to one dependency during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream is not far enough ahead to report
    UpToDate,
    /// Upstream does not advertise a latest version
    UnknownUpstream,
    /// This (dependency, version) pair was already reported
    AlreadyNotified,
    /// A notification was sent and recorded
    Notified,
}

/// Counters for one check cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub manifests_checked: usize,
    pub manifests_failed: usize,
    pub dependencies_checked: usize,
    pub notifications_sent: usize,
    pub already_notified: usize,
    pub unknown_upstream: usize,
    pub dependency_errors: usize,
}

impl CycleReport {
    fn record(&mut self, result: &Result<Outcome, CheckError>) {
        self.dependencies_checked += 1;
        match result {
            Ok(Outcome::UpToDate) => {}
            Ok(Outcome::UnknownUpstream) => self.unknown_upstream += 1,
            Ok(Outcome::AlreadyNotified) => self.already_notified += 1,
            Ok(Outcome::Notified) => self.notifications_sent += 1,
            Err(_) => self.dependency_errors += 1,
        }
    }

    fn merge(&mut self, other: CycleReport) {
        self.manifests_checked += other.manifests_checked;
        self.manifests_failed += other.manifests_failed;
        self.dependencies_checked += other.dependencies_checked;
        self.notifications_sent += other.notifications_sent;
        self.already_notified += other.already_notified;
        self.unknown_upstream += other.unknown_upstream;
        self.dependency_errors += other.dependency_errors;
    }
}

pub struct Orchestrator {
    fetcher: Arc<dyn ManifestFetcher>,
    parser: Arc<dyn Parser>,
    registry: Arc<dyn Registry>,
    ledger: Arc<dyn NotificationStore>,
    notifier: Arc<Notifier>,
    minor_watch: HashSet<String>,
    limiter: Arc<Semaphore>,
    stagger: Duration,
    /// Pairs claimed for notification during the current cycle, so two
    /// manifests declaring the same dependency cannot both send
    in_flight: Mutex<HashSet<(String, SemanticVersion)>>,
    /// Pairs that were sent but could not be recorded in the ledger; their
    /// claims outlive the cycle
    unrecorded: Mutex<HashSet<(String, SemanticVersion)>>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn ManifestFetcher>,
        parser: Arc<dyn Parser>,
        registry: Arc<dyn Registry>,
        ledger: Arc<dyn NotificationStore>,
        notifier: Arc<Notifier>,
        minor_watch: HashSet<String>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            fetcher,
            parser,
            registry,
            ledger,
            notifier,
            minor_watch,
            limiter: Arc::new(Semaphore::new(
                max_concurrent_fetches.clamp(1, Semaphore::MAX_PERMITS),
            )),
            stagger: Duration::from_millis(FETCH_STAGGER_DELAY_MS),
            in_flight: Mutex::new(HashSet::new()),
            unrecorded: Mutex::new(HashSet::new()),
        }
    }

    /// Override the delay between starting sibling dependency checks
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Run one full check over all manifests
    pub async fn run_cycle(&self, manifest_urls: &[String]) -> CycleReport {
        if manifest_urls.is_empty() {
            warn!("No manifests configured; nothing to check");
        }

        let reports = join_all(manifest_urls.iter().map(|url| self.check_manifest(url))).await;

        let mut total = CycleReport::default();
        for report in reports {
            total.merge(report);
        }
        self.release_cycle_claims();

        info!(
            "Cycle finished: {} manifests ({} failed), {} dependencies, {} notified, {} already notified, {} unknown upstream, {} errors",
            total.manifests_checked,
            total.manifests_failed,
            total.dependencies_checked,
            total.notifications_sent,
            total.already_notified,
            total.unknown_upstream,
            total.dependency_errors
        );

        total
    }

    async fn check_manifest(&self, manifest_url: &str) -> CycleReport {
        let mut report = CycleReport {
            manifests_checked: 1,
            ..Default::default()
        };

        let dependencies = match self.load_manifest(manifest_url).await {
            Ok(dependencies) => dependencies,
            Err(e) => {
                error!("Failed to load manifest {}: {}", manifest_url, e);
                report.manifests_failed = 1;
                return report;
            }
        };

        debug!(
            "{} declares {} dependencies",
            manifest_url,
            dependencies.len()
        );

        let futures = dependencies.iter().enumerate().map(|(i, dependency)| {
            let delay = self.stagger * i as u32;
            async move {
                sleep(delay).await;
                let result = self.check_dependency(manifest_url, dependency).await;
                if let Err(e) = &result {
                    error!(
                        "Failed to check {} ({}) from {}: {}",
                        dependency.name, dependency.version_spec, manifest_url, e
                    );
                }
                result
            }
        });

        for result in join_all(futures).await {
            report.record(&result);
        }

        report
    }

    async fn load_manifest(
        &self,
        manifest_url: &str,
    ) -> Result<Vec<DeclaredDependency>, CheckError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| CheckError::PoolClosed)?;

        let content = self.fetcher.fetch(manifest_url).await?;
        Ok(self.parser.parse(&content)?)
    }

    /// Check one declared dependency and notify if it crossed a threshold
    pub async fn check_dependency(
        &self,
        manifest_url: &str,
        dependency: &DeclaredDependency,
    ) -> Result<Outcome, CheckError> {
        let name = dependency.name.as_str();
        let declared = parse_version(&dependency.version_spec)?;
        self.ledger.set_declared_version(name, &declared)?;

        let latest = {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| CheckError::PoolClosed)?;
            self.registry.fetch_latest_version(name).await?
        };

        let Some(latest) = latest else {
            debug!("No upstream version for {}; skipping", name);
            return Ok(Outcome::UnknownUpstream);
        };

        let Some(severity) = classify(&declared, &latest, name, &self.minor_watch).severity()
        else {
            debug!("{} {} is current enough (latest {})", name, declared, latest);
            return Ok(Outcome::UpToDate);
        };

        if self.ledger.has_notified(name, &latest)? || !self.claim(name, latest) {
            debug!("{} {} already notified", name, latest);
            return Ok(Outcome::AlreadyNotified);
        }

        let notice = UpdateNotice {
            dependency: name.to_string(),
            declared,
            latest,
            manifest_url: manifest_url.to_string(),
            package_url: self.registry.package_url(name),
            severity,
        };

        if let Err(e) = self.notifier.notify(&notice).await {
            self.release(name, latest);
            return Err(e.into());
        }

        self.ledger.record_notified(name, &latest).inspect_err(|e| {
            error!(
                "Notified {} {} but could not record it; it may be sent again after a restart: {}",
                name, latest, e
            );
            self.hold_unrecorded(name, latest);
        })?;

        Ok(Outcome::Notified)
    }

    /// Reserve a pair for notification; false if already reserved
    fn claim(&self, name: &str, version: SemanticVersion) -> bool {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.insert((name.to_string(), version)),
            Err(_) => {
                warn!("In-flight set poisoned; relying on the ledger alone");
                true
            }
        }
    }

    fn release(&self, name: &str, version: SemanticVersion) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&(name.to_string(), version));
        }
    }

    fn hold_unrecorded(&self, name: &str, version: SemanticVersion) {
        if let Ok(mut unrecorded) = self.unrecorded.lock() {
            unrecorded.insert((name.to_string(), version));
        }
    }

    /// Drop the claims of finished notifications; the ledger answers for
    /// them from now on
    fn release_cycle_claims(&self) {
        let (Ok(mut in_flight), Ok(unrecorded)) = (self.in_flight.lock(), self.unrecorded.lock())
        else {
            return;
        };
        in_flight.retain(|pair| unrecorded.contains(pair));
    }
}
