//! npm package listing page scraper

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::registry::Registry;
use crate::version::semver::{SemanticVersion, parse_version};

/// Default base URL for npm package pages
pub const DEFAULT_BASE_URL: &str = "https://www.npmjs.com/package";

/// Marker the listing page renders next to the current release
static LATEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2})</strong>\s+is the latest").unwrap()
});

/// Extract the advertised latest version from a package page
pub fn extract_latest_version(html: &str) -> Option<SemanticVersion> {
    let captures = LATEST_RE.captures(html)?;
    parse_version(&captures[1]).ok()
}

/// Registry implementation reading the npm website's package pages
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("depwatch")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    fn package_url(&self, package_name: &str) -> String {
        format!("{}/{}", self.base_url, package_name)
    }

    async fn fetch_latest_version(
        &self,
        package_name: &str,
    ) -> Result<Option<SemanticVersion>, FetchError> {
        let url = self.package_url(package_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("npm has no page for {}", package_name);
            return Ok(None);
        }

        if !status.is_success() {
            warn!("npm returned status {}: {}", status, url);
            return Err(FetchError::Status { url, status });
        }

        let html = response.text().await?;
        let latest = extract_latest_version(&html);

        if latest.is_none() {
            debug!("No latest version marker on npm page for {}", package_name);
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::io::Write;
    use rstest::rstest;

    fn registry(base_url: &str) -> NpmRegistry {
        NpmRegistry::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[rstest]
    #[case(
        "<p><strong>4.17.21</strong> is the latest</p>",
        Some(SemanticVersion::new(4, 17, 21))
    )]
    #[case(
        "<span>v<strong>18.2.0</strong>\n   is the latest of 120 releases</span>",
        Some(SemanticVersion::new(18, 2, 0))
    )]
    #[case("<p><strong>4.17.21</strong> was released</p>", None)]
    #[case("<p><strong>\u{0664}.\u{0661}.\u{0662}</strong> is the latest</p>", None)]
    #[case("<html><body>Not found</body></html>", None)]
    fn extract_latest_version_reads_marker(
        #[case] html: &str,
        #[case] expected: Option<SemanticVersion>,
    ) {
        assert_eq!(extract_latest_version(html), expected);
    }

    #[tokio::test]
    async fn fetch_latest_version_returns_version_from_page() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lodash")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<div><strong>4.17.21</strong> is the latest</div>")
            .create_async()
            .await;

        let result = registry(&server.url())
            .fetch_latest_version("lodash")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some(SemanticVersion::new(4, 17, 21)));
    }

    #[tokio::test]
    async fn fetch_latest_version_returns_none_when_marker_missing() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/left-pad")
            .with_status(200)
            .with_body("<div>This package has been deprecated</div>")
            .create_async()
            .await;

        let result = registry(&server.url())
            .fetch_latest_version("left-pad")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn fetch_latest_version_returns_none_for_nonexistent_package() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/nonexistent-package")
            .with_status(404)
            .create_async()
            .await;

        let result = registry(&server.url())
            .fetch_latest_version("nonexistent-package")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn fetch_latest_version_returns_status_error_on_server_failure() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/react")
            .with_status(503)
            .create_async()
            .await;

        let result = registry(&server.url()).fetch_latest_version("react").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(FetchError::Status { status, .. }) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn fetch_latest_version_times_out_on_slow_page() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/slow-pkg")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(b"<strong>1.0.0</strong> is the latest")
            })
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url(), Duration::from_millis(100)).unwrap();
        let result = registry.fetch_latest_version("slow-pkg").await;

        assert!(matches!(result, Err(FetchError::Network(e)) if e.is_timeout()));
    }

    #[test]
    fn package_url_joins_base_and_name() {
        let registry = registry("https://www.npmjs.com/package/");

        assert_eq!(
            registry.package_url("@types/node"),
            "https://www.npmjs.com/package/@types/node"
        );
    }
}
