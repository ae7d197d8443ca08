//! Manifest parsing and fetching traits

#[cfg(test)]
use mockall::automock;

use crate::parser::types::DeclaredDependency;
use crate::version::error::FetchError;

/// Trait for parsing manifest files
pub trait Parser: Send + Sync {
    /// Parse the content and extract the declared dependencies
    fn parse(&self, content: &str) -> Result<Vec<DeclaredDependency>, ParseError>;
}

/// Trait for retrieving raw manifest text
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch the manifest at `url`. Transport and status failures are `FetchError`s;
    /// the body is returned untouched, even if it is not valid JSON.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Manifest is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Manifest root is not a JSON object
    #[error("Manifest root is not an object")]
    NotAnObject,

    /// No `major.minor.patch` triple in the version string
    #[error("Invalid version: {0:?}")]
    InvalidVersion(String),
}
