//! Mock HTTP endpoints and orchestrator wiring for end-to-end tests

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use depwatch::notify::notifier::{Envelope, Notifier};
use depwatch::notify::sendgrid::SendGridTransport;
use depwatch::parser::fetcher::HttpManifestFetcher;
use depwatch::parser::package_json::PackageJsonParser;
use depwatch::version::ledger::Ledger;
use depwatch::version::registries::npm::NpmRegistry;
use depwatch::watch::orchestrator::Orchestrator;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Create a ledger in a fresh temporary directory
pub fn create_test_ledger() -> (TempDir, Arc<Ledger>) {
    let temp_dir = TempDir::new().unwrap();
    let ledger = open_ledger(&temp_dir.path().join("ledger.db"));
    (temp_dir, ledger)
}

/// Open (or reopen) a ledger at `path`
pub fn open_ledger(path: &Path) -> Arc<Ledger> {
    Arc::new(Ledger::new(path).unwrap())
}

/// Orchestrator whose manifest, registry and mail endpoints all live on `server`.
/// The npm listing is served under `/package/<name>`.
pub fn build_orchestrator(
    server: &ServerGuard,
    ledger: Arc<Ledger>,
    minor_watch: &[&str],
) -> Orchestrator {
    build_orchestrator_with_timeout(server, ledger, minor_watch, TIMEOUT)
}

/// Same as [`build_orchestrator`] with a custom per-request timeout
pub fn build_orchestrator_with_timeout(
    server: &ServerGuard,
    ledger: Arc<Ledger>,
    minor_watch: &[&str],
    timeout: Duration,
) -> Orchestrator {
    let registry = NpmRegistry::new(&format!("{}/package", server.url()), timeout).unwrap();
    let transport = SendGridTransport::new(&server.url(), "test-key", timeout).unwrap();
    let notifier = Notifier::new(
        Arc::new(transport),
        Envelope {
            from_email: "bot@example.com".to_string(),
            from_name: "Dependency Bot".to_string(),
            to: vec!["dev@example.com".to_string()],
        },
    );

    Orchestrator::new(
        Arc::new(HttpManifestFetcher::new(timeout).unwrap()),
        Arc::new(PackageJsonParser::new()),
        Arc::new(registry),
        ledger,
        Arc::new(notifier),
        minor_watch.iter().map(|s| s.to_string()).collect(),
        4,
    )
    .with_stagger(Duration::ZERO)
}

/// Serve `body` as a manifest at `path`
pub async fn mock_manifest(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// Serve an npm package page advertising `latest`
pub async fn mock_npm_page(server: &mut ServerGuard, package: &str, latest: &str) -> Mock {
    server
        .mock("GET", format!("/package/{}", package).as_str())
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(format!(
            "<html><body><h2>{package}</h2><p><strong>{latest}</strong> is the latest of 42 releases</p></body></html>"
        ))
        .create_async()
        .await
}

/// Serve an npm package page that takes `delay` before sending its body
pub async fn mock_slow_npm_page(server: &mut ServerGuard, package: &str, delay: Duration) -> Mock {
    server
        .mock("GET", format!("/package/{}", package).as_str())
        .with_status(200)
        .with_chunked_body(move |w| {
            std::thread::sleep(delay);
            w.write_all(b"<p><strong>99.0.0</strong> is the latest</p>")
        })
        .create_async()
        .await
}

/// Accept mail whose subject is `subject`, expecting exactly `hits` sends
pub async fn mock_mail_send(
    server: &mut ServerGuard,
    subject: &str,
    status: usize,
    hits: usize,
) -> Mock {
    server
        .mock("POST", "/v3/mail/send")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({ "subject": subject })))
        .with_status(status)
        .expect(hits)
        .create_async()
        .await
}
