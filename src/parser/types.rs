//! Common types for parsers

/// A dependency as declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Package name (e.g., "lodash", "@types/node")
    pub name: String,
    /// Version specification as written (e.g., "^4.17.21")
    pub version_spec: String,
}

impl DeclaredDependency {
    pub fn new(name: impl Into<String>, version_spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_spec: version_spec.into(),
        }
    }
}
