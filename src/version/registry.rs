//! Registry trait for looking up the latest published version of a package

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;
use crate::version::semver::SemanticVersion;

/// Trait for fetching the latest upstream version of a dependency
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Public listing URL for a package, used as a link in notifications
    fn package_url(&self, package_name: &str) -> String;

    /// Fetches the latest published version of a package
    ///
    /// # Returns
    /// * `Ok(Some(version))` - The latest version advertised upstream
    /// * `Ok(None)` - The registry does not advertise a latest version (unknown or unpublished package)
    /// * `Err(FetchError)` - If the request fails
    async fn fetch_latest_version(
        &self,
        package_name: &str,
    ) -> Result<Option<SemanticVersion>, FetchError>;
}
