//! Artifact store backends.

mod filesystem;
mod inmemory;

pub use filesystem::FsArtifactStore;
pub use inmemory::InMemoryArtifactStore;
