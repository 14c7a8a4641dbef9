//! Mock matching.
//!
//! A [`MockMatcher`] looks a request up in the mock collection and, on a hit,
//! returns the body to replay. Two strategies exist and exactly one is built
//! per process:
//!
//! - [`FullUrlMatcher`]: a mock matches when its `full-url` equals the lookup
//!   key; the replayed body is the JSON encoding of its `response.body`.
//! - [`FolderSubstringMatcher`]: mocks live in named sub-groups; the group
//!   name is matched against the lookup key and the file stem against the
//!   serialized request body; the file is replayed verbatim.

mod folder;
mod full_url;

pub use folder::FolderSubstringMatcher;
pub use full_url::{find_by_full_url, FullUrlMatcher};

use crate::config::MatchStrategy;
use crate::store::{ArtifactName, ArtifactStore};
use serde_json::Value;
use std::sync::Arc;

/// A mock that answered a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHit {
    pub artifact: ArtifactName,
    /// Sub-group holding the artifact, for grouped layouts
    pub group: Option<String>,
    /// Response body to send back, already JSON-encoded
    pub body: String,
}

pub trait MockMatcher: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    /// Find the mock answering `lookup_key` with request `body`.
    ///
    /// Unreadable or malformed artifacts are skipped; they never fail the scan.
    fn find(&self, lookup_key: &str, body: &Value) -> Option<MockHit>;
}

/// Build the matcher for the configured strategy.
pub fn create_matcher(strategy: MatchStrategy, store: Arc<dyn ArtifactStore>) -> Arc<dyn MockMatcher> {
    match strategy {
        MatchStrategy::FullUrl => Arc::new(FullUrlMatcher::new(store)),
        MatchStrategy::FolderSubstring => Arc::new(FolderSubstringMatcher::new(store)),
    }
}
