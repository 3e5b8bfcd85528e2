//! Build identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one aggregation unit: a build inside a branch.
///
/// Implements `Ord` (branch, then build) so keys iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildKey {
    /// Branch name.
    pub branch: String,
    /// Build name.
    pub build: String,
}

impl BuildKey {
    /// Create a new build key.
    pub fn new(branch: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            build: build.into(),
        }
    }
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.branch, self.build)
    }
}

/// Import status of a build as seen by a browsing front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildImportStatus {
    /// No aggregated data exists yet.
    Unprocessed,
    /// Aggregated data exists and matches the current format version.
    Success,
    /// Aggregated data exists but was written by another format version.
    Outdated,
    /// The import of this build failed.
    Failed,
}

impl BuildImportStatus {
    /// Whether the build can be browsed without recomputation.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for BuildImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unprocessed => write!(f, "unprocessed"),
            Self::Success => write!(f, "success"),
            Self::Outdated => write!(f, "outdated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
