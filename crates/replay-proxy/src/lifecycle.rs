//! Lifecycle operations over recorded artifacts.
//!
//! Listing, fetching, bulk deletion of logs, and promotion/demotion between
//! the log and mock collections. The HTTP layer in `admin_api` is a thin
//! wrapper around [`LifecycleService`].

use crate::matcher::find_by_full_url;
use crate::metrics;
use crate::store::{newest_first, ArtifactName, ArtifactStore, Collection, StoreError};
use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid file name: {0}")]
    InvalidName(String),
    #[error("{name} not found in {collection}")]
    NotFound {
        collection: Collection,
        name: String,
    },
    #[error("{name} already exists in {collection}")]
    Conflict {
        collection: Collection,
        name: String,
    },
    #[error(transparent)]
    Store(StoreError),
}

impl LifecycleError {
    pub fn status(&self) -> StatusCode {
        match self {
            LifecycleError::InvalidName(_) => StatusCode::BAD_REQUEST,
            LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
            LifecycleError::Conflict { .. } => StatusCode::CONFLICT,
            LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidName(name) => LifecycleError::InvalidName(name),
            StoreError::NotFound { collection, name } => {
                LifecycleError::NotFound { collection, name }
            }
            StoreError::AlreadyExists { collection, name } => {
                LifecycleError::Conflict { collection, name }
            }
            other => LifecycleError::Store(other),
        }
    }
}

/// Result of a bulk log purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: Vec<String>,
    pub count: usize,
}

pub struct LifecycleService {
    store: Arc<dyn ArtifactStore>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Artifact names, newest first.
    ///
    /// With `newer_than`, only names created strictly after it are returned;
    /// the reference itself does not have to exist.
    pub fn list(
        &self,
        collection: Collection,
        newer_than: Option<&str>,
    ) -> Result<Vec<ArtifactName>, LifecycleError> {
        let reference = newer_than
            .filter(|latest| !latest.is_empty())
            .map(ArtifactName::new)
            .transpose()?;

        let mut names = self.store.list(collection)?;
        if let Some(reference) = &reference {
            names.retain(|name| name.is_newer_than(reference));
        }
        newest_first(&mut names);
        Ok(names)
    }

    pub fn list_logs(&self, latest: Option<&str>) -> Result<Vec<ArtifactName>, LifecycleError> {
        let result = self.list(Collection::Log, latest);
        metrics::record_lifecycle_op("list", result.is_ok());
        result
    }

    pub fn list_mocks(&self) -> Result<Vec<ArtifactName>, LifecycleError> {
        let result = self.list(Collection::Mock, None);
        metrics::record_lifecycle_op("list", result.is_ok());
        result
    }

    /// Raw bytes of a named artifact. Names that could escape the collection
    /// are rejected before touching the store.
    pub fn fetch(&self, collection: Collection, name: &str) -> Result<Vec<u8>, LifecycleError> {
        let result = ArtifactName::new(name)
            .map_err(LifecycleError::from)
            .and_then(|name| Ok(self.store.read(collection, &name)?));
        metrics::record_lifecycle_op("fetch", result.is_ok());
        result
    }

    /// Delete every log artifact. Deleting from an empty collection succeeds.
    pub fn delete_all_logs(&self) -> Result<DeleteSummary, LifecycleError> {
        let mut names = match self.store.list(Collection::Log) {
            Ok(names) => names,
            Err(e) => {
                metrics::record_lifecycle_op("delete_all", false);
                return Err(e.into());
            }
        };
        names.sort();

        let mut deleted = Vec::with_capacity(names.len());
        for name in names {
            match self.store.delete(Collection::Log, &name) {
                Ok(()) => deleted.push(name.to_string()),
                // Removed concurrently, e.g. promoted while we were deleting
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => warn!("Failed to delete log {}: {}", name, e),
            }
        }

        info!("Deleted {} log artifacts", deleted.len());
        metrics::record_lifecycle_op("delete_all", true);
        Ok(DeleteSummary {
            count: deleted.len(),
            deleted,
        })
    }

    /// Move a log artifact into the mock collection.
    pub fn promote(&self, name: &str) -> Result<ArtifactName, LifecycleError> {
        self.transfer("promote", name, Collection::Log, Collection::Mock)
    }

    /// Move a mock artifact back into the log collection.
    pub fn demote(&self, name: &str) -> Result<ArtifactName, LifecycleError> {
        self.transfer("demote", name, Collection::Mock, Collection::Log)
    }

    fn transfer(
        &self,
        operation: &str,
        name: &str,
        from: Collection,
        to: Collection,
    ) -> Result<ArtifactName, LifecycleError> {
        let result = ArtifactName::new(name)
            .and_then(|name| self.store.move_between(&name, from, to).map(|()| name))
            .map_err(LifecycleError::from);

        match &result {
            Ok(name) => info!("Moved {} from {} to {}", name, from, to),
            Err(e) => warn!("Failed to {} {}: {}", operation, name, e),
        }
        metrics::record_lifecycle_op(operation, result.is_ok());
        result
    }

    /// Whether any mock's `full-url` equals `url`.
    pub fn is_mocked(&self, url: &str) -> bool {
        let mocked = find_by_full_url(self.store.as_ref(), url).is_some();
        metrics::record_lifecycle_op("is_mocked", true);
        mocked
    }
}
