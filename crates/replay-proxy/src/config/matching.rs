//! Mock matching strategy selection.

use serde::{Deserialize, Serialize};

/// Which matcher answers mock lookups. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    /// Exact comparison of the lookup key against each mock's `full-url`
    #[default]
    FullUrl,
    /// Legacy layout: sub-group name contained in the URL, file stem
    /// contained in the serialized request body
    FolderSubstring,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MatchingConfig {
    #[serde(default)]
    pub strategy: MatchStrategy,
}
