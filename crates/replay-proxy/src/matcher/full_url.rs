use super::{MockHit, MockMatcher};
use crate::store::{ArtifactName, ArtifactStore, Collection};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Exact match on the stored `full-url` field.
pub struct FullUrlMatcher {
    store: Arc<dyn ArtifactStore>,
}

impl FullUrlMatcher {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

impl MockMatcher for FullUrlMatcher {
    fn name(&self) -> &'static str {
        "fullUrl"
    }

    fn find(&self, lookup_key: &str, _body: &Value) -> Option<MockHit> {
        let (artifact, document) = find_by_full_url(self.store.as_ref(), lookup_key)?;
        let Some(response_body) = document.pointer("/response/body") else {
            warn!("Mock {} matched {} but has no response.body", artifact, lookup_key);
            return None;
        };
        match serde_json::to_string(response_body) {
            Ok(body) => Some(MockHit {
                artifact,
                group: None,
                body,
            }),
            Err(e) => {
                warn!("Failed to encode body of mock {}: {}", artifact, e);
                None
            }
        }
    }
}

/// First mock, in creation order, whose `full-url` equals `url`.
pub fn find_by_full_url(store: &dyn ArtifactStore, url: &str) -> Option<(ArtifactName, Value)> {
    let mut names = match store.list(Collection::Mock) {
        Ok(names) => names,
        Err(e) => {
            warn!("Failed to list mock collection: {}", e);
            return None;
        }
    };
    names.sort();

    for name in names {
        let raw = match store.read(Collection::Mock, &name) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping unreadable mock {}: {}", name, e);
                continue;
            }
        };
        let document: Value = match serde_json::from_slice(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping malformed mock {}: {}", name, e);
                continue;
            }
        };
        if document.get("full-url").and_then(Value::as_str) == Some(url) {
            return Some((name, document));
        }
    }
    None
}
