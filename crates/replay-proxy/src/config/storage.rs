//! Artifact storage layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Two sibling directories under a common root, one per collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory both collections live under (default: current directory)
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Observed interactions, relative to `root` unless absolute
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Replay artifacts, relative to `root` unless absolute
    #[serde(default = "default_mocks_dir")]
    pub mocks_dir: PathBuf,
}

impl StorageConfig {
    pub fn logs_path(&self) -> PathBuf {
        self.root.join(&self.logs_dir)
    }

    pub fn mocks_path(&self) -> PathBuf {
        self.root.join(&self.mocks_dir)
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_mocks_dir() -> PathBuf {
    PathBuf::from("mocked")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            logs_dir: default_logs_dir(),
            mocks_dir: default_mocks_dir(),
        }
    }
}
