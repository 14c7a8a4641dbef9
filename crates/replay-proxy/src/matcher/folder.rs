use super::{MockHit, MockMatcher};
use crate::store::{ArtifactStore, Collection};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Legacy grouped layout.
///
/// A group named `api:users` serves lookup keys containing `api/users`. Inside
/// it, `alice.json` answers any request whose JSON body mentions `alice`.
pub struct FolderSubstringMatcher {
    store: Arc<dyn ArtifactStore>,
}

impl FolderSubstringMatcher {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// First group, in name order, whose name appears in the lookup key.
    fn matching_group(&self, lookup_key: &str) -> Option<String> {
        let key = lookup_key.replace('/', ":");
        let mut groups = match self.store.groups(Collection::Mock) {
            Ok(groups) => groups,
            Err(e) => {
                warn!("Failed to list mock groups: {}", e);
                return None;
            }
        };
        groups.sort();
        groups.into_iter().find(|group| key.contains(group.as_str()))
    }
}

impl MockMatcher for FolderSubstringMatcher {
    fn name(&self) -> &'static str {
        "folderSubstring"
    }

    fn find(&self, lookup_key: &str, body: &Value) -> Option<MockHit> {
        if !body.is_object() {
            return None;
        }
        let group = self.matching_group(lookup_key)?;
        let serialized = body.to_string();

        let mut names = match self.store.list_group(Collection::Mock, &group) {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to list mock group {}: {}", group, e);
                return None;
            }
        };
        names.sort();

        for name in names {
            let stem = name.stem();
            if stem.is_empty() || !serialized.contains(stem) {
                continue;
            }
            let raw = match self.store.read_group(Collection::Mock, &group, &name) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("Skipping unreadable mock {}/{}: {}", group, name, e);
                    continue;
                }
            };
            match String::from_utf8(raw) {
                Ok(body) => {
                    return Some(MockHit {
                        artifact: name,
                        group: Some(group),
                        body,
                    })
                }
                Err(_) => warn!("Skipping non UTF-8 mock {}/{}", group, name),
            }
        }
        None
    }
}
