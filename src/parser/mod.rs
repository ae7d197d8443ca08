//! Parser layer
//! - traits.rs: Parser and ManifestFetcher traits, ParseError
//! - types.rs: Common types (DeclaredDependency)
//! - package_json.rs: package.json parser
//! - fetcher.rs: HTTP manifest fetcher

pub mod fetcher;
pub mod package_json;
pub mod traits;
pub mod types;

pub use fetcher::HttpManifestFetcher;
pub use package_json::PackageJsonParser;
pub use traits::{ManifestFetcher, ParseError, Parser};
pub use types::DeclaredDependency;
