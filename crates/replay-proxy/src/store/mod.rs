//! Artifact store: two named collections of JSON documents keyed by filename.
//!
//! The engine, matcher, recorder and lifecycle API only ever see the
//! [`ArtifactStore`] trait, so the filesystem backend can be swapped for an
//! embedded key-value store without touching request handling.
//!
//! # Module Structure
//!
//! - `name` - validated artifact names and ordering helpers

mod name;

pub use name::{newest_first, ArtifactName, ARTIFACT_EXTENSION};
pub(crate) use name::validate_segment;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::StorageConfig;

/// The two collections an artifact can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Observed interactions.
    Log,
    /// Authoritative interactions used for replay.
    Mock,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Log => "log",
            Collection::Mock => "mock",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{name} not found in {collection} collection")]
    NotFound {
        collection: Collection,
        name: String,
    },
    #[error("{name} already exists in {collection} collection")]
    AlreadyExists {
        collection: Collection,
        name: String,
    },
    #[error("invalid artifact name: {0}")]
    InvalidName(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: Collection, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection,
            name: name.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend-agnostic persistence for interaction artifacts.
///
/// Every operation blocks; async callers run them on the blocking pool.
pub trait ArtifactStore: Send + Sync {
    /// All artifact names in a collection, in no particular order.
    fn list(&self, collection: Collection) -> StoreResult<Vec<ArtifactName>>;

    /// Raw bytes of an artifact.
    fn read(&self, collection: Collection, name: &ArtifactName) -> StoreResult<Vec<u8>>;

    /// Create or replace an artifact. Readers never observe a partial write.
    fn write(&self, collection: Collection, name: &ArtifactName, contents: &[u8])
        -> StoreResult<()>;

    fn delete(&self, collection: Collection, name: &ArtifactName) -> StoreResult<()>;

    /// Move an artifact between collections. Exactly one collection holds the
    /// artifact before and after the call; an existing destination is an error.
    fn move_between(&self, name: &ArtifactName, from: Collection, to: Collection)
        -> StoreResult<()>;

    /// Named sub-groups of a collection (legacy mock layout).
    fn groups(&self, collection: Collection) -> StoreResult<Vec<String>>;

    /// Artifact names inside a sub-group.
    fn list_group(&self, collection: Collection, group: &str) -> StoreResult<Vec<ArtifactName>>;

    /// Raw bytes of an artifact inside a sub-group.
    fn read_group(
        &self,
        collection: Collection,
        group: &str,
        name: &ArtifactName,
    ) -> StoreResult<Vec<u8>>;
}

/// Create the configured artifact store.
pub fn create_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ArtifactStore>> {
    use crate::backends::FsArtifactStore;

    let store = FsArtifactStore::open(config.logs_path(), config.mocks_path())?;
    tracing::info!(
        "Using filesystem artifact store (logs={}, mocks={})",
        config.logs_path().display(),
        config.mocks_path().display()
    );
    Ok(Arc::new(store))
}
