use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::traits::ParseError;

/// First `major.minor.patch` triple of 1-2 ASCII digit components anywhere in the input
static TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{1,2})").unwrap());

/// A `major.minor.patch` version as declared in a manifest or published upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for SemanticVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

/// Parse a version string into a `SemanticVersion`.
///
/// Range operators and any other leading text are skipped; the first
/// dotted triple found is used and all three components come from that
/// single match.
///
/// Examples:
/// - "^1.2.3" -> (1, 2, 3)
/// - "~0.14.0-beta.2" -> (0, 14, 0)
/// - ">=4.1.0 <5.0.0" -> (4, 1, 0)
pub fn parse_version(raw: &str) -> Result<SemanticVersion, ParseError> {
    let captures = TRIPLE_RE
        .captures(raw)
        .ok_or_else(|| ParseError::InvalidVersion(raw.to_string()))?;

    let component = |index: usize| -> Result<u32, ParseError> {
        captures[index]
            .parse()
            .map_err(|_| ParseError::InvalidVersion(raw.to_string()))
    };

    Ok(SemanticVersion::new(component(1)?, component(2)?, component(3)?))
}
