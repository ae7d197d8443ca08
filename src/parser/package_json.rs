//! package.json parser

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::DeclaredDependency;

/// Dependency sections of a package.json; everything else is ignored
#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: Option<IndexMap<String, Value>>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Option<IndexMap<String, Value>>,
}

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PackageJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PackageJsonParser {
    /// Merges `dependencies` and `devDependencies`; a name declared in both
    /// takes its version from `devDependencies`.
    fn parse(&self, content: &str) -> Result<Vec<DeclaredDependency>, ParseError> {
        let root: Value = serde_json::from_str(content)?;
        if !root.is_object() {
            return Err(ParseError::NotAnObject);
        }

        let manifest: PackageJson = serde_json::from_value(root)?;

        let mut merged: IndexMap<String, Value> = manifest.dependencies.unwrap_or_default();
        for (name, spec) in manifest.dev_dependencies.unwrap_or_default() {
            merged.insert(name, spec);
        }

        let dependencies = merged
            .into_iter()
            .filter_map(|(name, spec)| match spec {
                Value::String(spec) => Some(DeclaredDependency::new(name, spec)),
                other => {
                    warn!("Ignoring {}: version is not a string ({})", name, other);
                    None
                }
            })
            .collect();

        Ok(dependencies)
    }
}
