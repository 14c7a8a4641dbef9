use crate::store::{
    validate_segment, ArtifactName, ArtifactStore, Collection, StoreError, StoreResult,
};
use parking_lot::RwLock;
use std::collections::HashMap;

type Artifacts = HashMap<(Collection, ArtifactName), Vec<u8>>;
type GroupedArtifacts = HashMap<(Collection, String), HashMap<ArtifactName, Vec<u8>>>;

/// In-memory implementation of ArtifactStore
///
/// Useful for testing and for running the engine without touching disk.
/// A single lock covers both collections, so moves are atomic.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<Artifacts>,
    groups: RwLock<GroupedArtifacts>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an artifact inside a named sub-group.
    pub fn insert_grouped(
        &self,
        collection: Collection,
        group: &str,
        name: &ArtifactName,
        contents: &[u8],
    ) -> StoreResult<()> {
        validate_segment(group)?;
        self.groups
            .write()
            .entry((collection, group.to_string()))
            .or_default()
            .insert(name.clone(), contents.to_vec());
        Ok(())
    }

    /// Number of artifacts in a collection (top level only).
    pub fn len(&self, collection: Collection) -> usize {
        self.artifacts
            .read()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn list(&self, collection: Collection) -> StoreResult<Vec<ArtifactName>> {
        Ok(self
            .artifacts
            .read()
            .keys()
            .filter(|(c, name)| *c == collection && name.is_json())
            .map(|(_, name)| name.clone())
            .collect())
    }

    fn read(&self, collection: Collection, name: &ArtifactName) -> StoreResult<Vec<u8>> {
        self.artifacts
            .read()
            .get(&(collection, name.clone()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, name.as_str()))
    }

    fn write(
        &self,
        collection: Collection,
        name: &ArtifactName,
        contents: &[u8],
    ) -> StoreResult<()> {
        self.artifacts
            .write()
            .insert((collection, name.clone()), contents.to_vec());
        Ok(())
    }

    fn delete(&self, collection: Collection, name: &ArtifactName) -> StoreResult<()> {
        self.artifacts
            .write()
            .remove(&(collection, name.clone()))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, name.as_str()))
    }

    fn move_between(
        &self,
        name: &ArtifactName,
        from: Collection,
        to: Collection,
    ) -> StoreResult<()> {
        let mut artifacts = self.artifacts.write();

        if !artifacts.contains_key(&(from, name.clone())) {
            return Err(StoreError::not_found(from, name.as_str()));
        }
        if artifacts.contains_key(&(to, name.clone())) {
            return Err(StoreError::AlreadyExists {
                collection: to,
                name: name.to_string(),
            });
        }

        if let Some(contents) = artifacts.remove(&(from, name.clone())) {
            artifacts.insert((to, name.clone()), contents);
        }
        Ok(())
    }

    fn groups(&self, collection: Collection) -> StoreResult<Vec<String>> {
        Ok(self
            .groups
            .read()
            .keys()
            .filter(|(c, _)| *c == collection)
            .map(|(_, group)| group.clone())
            .collect())
    }

    fn list_group(&self, collection: Collection, group: &str) -> StoreResult<Vec<ArtifactName>> {
        validate_segment(group)?;
        Ok(self
            .groups
            .read()
            .get(&(collection, group.to_string()))
            .map(|entries| entries.keys().filter(|n| n.is_json()).cloned().collect())
            .unwrap_or_default())
    }

    fn read_group(
        &self,
        collection: Collection,
        group: &str,
        name: &ArtifactName,
    ) -> StoreResult<Vec<u8>> {
        validate_segment(group)?;
        self.groups
            .read()
            .get(&(collection, group.to_string()))
            .and_then(|entries| entries.get(name).cloned())
            .ok_or_else(|| StoreError::not_found(collection, format!("{group}/{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ArtifactName {
        ArtifactName::new(s).unwrap()
    }

    #[test]
    fn test_inmemory_write_read() {
        let store = InMemoryArtifactStore::new();
        store.write(Collection::Log, &name("1_a.json"), b"{}").unwrap();

        assert_eq!(store.read(Collection::Log, &name("1_a.json")).unwrap(), b"{}");
        assert!(store.read(Collection::Mock, &name("1_a.json")).is_err());
        assert_eq!(store.len(Collection::Log), 1);
        assert!(store.is_empty(Collection::Mock));
    }

    #[test]
    fn test_inmemory_move_roundtrip() {
        let store = InMemoryArtifactStore::new();
        let artifact = name("123_abc.json");
        store.write(Collection::Log, &artifact, b"payload").unwrap();

        store
            .move_between(&artifact, Collection::Log, Collection::Mock)
            .unwrap();
        assert!(store.list(Collection::Log).unwrap().is_empty());
        assert_eq!(store.list(Collection::Mock).unwrap(), vec![artifact.clone()]);

        store
            .move_between(&artifact, Collection::Mock, Collection::Log)
            .unwrap();
        assert_eq!(store.read(Collection::Log, &artifact).unwrap(), b"payload");
        assert!(store.list(Collection::Mock).unwrap().is_empty());
    }

    #[test]
    fn test_inmemory_move_conflicts() {
        let store = InMemoryArtifactStore::new();
        let artifact = name("1_a.json");
        assert!(matches!(
            store.move_between(&artifact, Collection::Log, Collection::Mock),
            Err(StoreError::NotFound { .. })
        ));

        store.write(Collection::Log, &artifact, b"a").unwrap();
        store.write(Collection::Mock, &artifact, b"b").unwrap();
        assert!(matches!(
            store.move_between(&artifact, Collection::Log, Collection::Mock),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_inmemory_groups() {
        let store = InMemoryArtifactStore::new();
        store
            .insert_grouped(Collection::Mock, "api:login", &name("alice.json"), b"{}")
            .unwrap();

        assert_eq!(store.groups(Collection::Mock).unwrap(), vec!["api:login"]);
        assert!(store.groups(Collection::Log).unwrap().is_empty());
        assert_eq!(
            store.list_group(Collection::Mock, "api:login").unwrap(),
            vec![name("alice.json")]
        );
        assert!(store.list_group(Collection::Mock, "missing").unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_writes_distinct_names() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryArtifactStore::new());
        let handles: Vec<_> = (0..8)
            .map(|thread_id| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        let artifact = name(&format!("{thread_id}{i:03}_t.json"));
                        store.write(Collection::Log, &artifact, b"{}").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(Collection::Log), 400);
    }
}
