//! Update classification for declared vs. upstream versions

use std::collections::HashSet;
use std::fmt;

use crate::version::semver::SemanticVersion;

/// How far the upstream version has moved past the declared one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Nothing worth reporting (equal, patch-only, downgrade, or unwatched minor)
    None,
    /// Newer minor within the same major, for a dependency in the minor-watch set
    Minor,
    /// Newer major
    Major,
}

impl UpdateKind {
    /// Severity to notify with, or None when no notification is warranted
    pub fn severity(self) -> Option<Severity> {
        match self {
            UpdateKind::None => None,
            UpdateKind::Minor => Some(Severity::Minor),
            UpdateKind::Major => Some(Severity::Major),
        }
    }
}

/// Severity tag carried by a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Minor,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the move from `declared` to `upstream`.
///
/// A higher upstream major is always `Major`. A higher minor within the same
/// major is `Minor` only for dependencies in `minor_watch`. Patch bumps,
/// equal versions and downgrades are `None`.
pub fn classify(
    declared: &SemanticVersion,
    upstream: &SemanticVersion,
    dependency_name: &str,
    minor_watch: &HashSet<String>,
) -> UpdateKind {
    if upstream.major > declared.major {
        UpdateKind::Major
    } else if upstream.major == declared.major
        && upstream.minor > declared.minor
        && minor_watch.contains(dependency_name)
    {
        UpdateKind::Minor
    } else {
        UpdateKind::None
    }
}
