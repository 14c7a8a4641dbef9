use crate::store::{
    validate_segment, ArtifactName, ArtifactStore, Collection, StoreError, StoreResult,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Filesystem implementation of ArtifactStore
///
/// Each collection is a directory holding one `*.json` file per artifact.
/// Writes land in a temporary file in the same directory and are renamed into
/// place, so a concurrent reader sees either the old file or the new one.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    logs_dir: PathBuf,
    mocks_dir: PathBuf,
}

impl FsArtifactStore {
    /// Open (and create if needed) the two collection directories.
    pub fn open(logs_dir: impl Into<PathBuf>, mocks_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let store = Self {
            logs_dir: logs_dir.into(),
            mocks_dir: mocks_dir.into(),
        };
        fs::create_dir_all(&store.logs_dir)?;
        fs::create_dir_all(&store.mocks_dir)?;
        Ok(store)
    }

    pub fn dir(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Log => &self.logs_dir,
            Collection::Mock => &self.mocks_dir,
        }
    }

    fn path_of(&self, collection: Collection, name: &ArtifactName) -> PathBuf {
        self.dir(collection).join(name.as_str())
    }

    fn group_dir(&self, collection: Collection, group: &str) -> StoreResult<PathBuf> {
        validate_segment(group)?;
        Ok(self.dir(collection).join(group))
    }

    fn list_json_files(dir: &Path) -> StoreResult<Vec<ArtifactName>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 file name in {}", dir.display());
                continue;
            };
            match ArtifactName::new(file_name) {
                Ok(name) if name.is_json() => names.push(name),
                Ok(_) => {}
                Err(e) => debug!("Skipping {}: {}", dir.display(), e),
            }
        }
        Ok(names)
    }

    fn read_file(path: &Path, collection: Collection, name: &ArtifactName) -> StoreResult<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::not_found(collection, name.as_str()),
            _ => StoreError::Io(e),
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn list(&self, collection: Collection) -> StoreResult<Vec<ArtifactName>> {
        Self::list_json_files(self.dir(collection))
    }

    fn read(&self, collection: Collection, name: &ArtifactName) -> StoreResult<Vec<u8>> {
        Self::read_file(&self.path_of(collection, name), collection, name)
    }

    fn write(
        &self,
        collection: Collection,
        name: &ArtifactName,
        contents: &[u8],
    ) -> StoreResult<()> {
        let dir = self.dir(collection);
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_of(collection, name))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn delete(&self, collection: Collection, name: &ArtifactName) -> StoreResult<()> {
        fs::remove_file(self.path_of(collection, name)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::not_found(collection, name.as_str()),
            _ => StoreError::Io(e),
        })
    }

    fn move_between(
        &self,
        name: &ArtifactName,
        from: Collection,
        to: Collection,
    ) -> StoreResult<()> {
        let source = self.path_of(from, name);
        let destination = self.path_of(to, name);

        if !source.is_file() {
            return Err(StoreError::not_found(from, name.as_str()));
        }

        fs::create_dir_all(self.dir(to))?;
        // Linking fails instead of replacing when the destination exists.
        fs::hard_link(&source, &destination).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists {
                collection: to,
                name: name.to_string(),
            },
            io::ErrorKind::NotFound => StoreError::not_found(from, name.as_str()),
            _ => StoreError::Io(e),
        })?;

        if let Err(e) = fs::remove_file(&source) {
            let _ = fs::remove_file(&destination);
            return Err(match e.kind() {
                io::ErrorKind::NotFound => StoreError::not_found(from, name.as_str()),
                _ => StoreError::Io(e),
            });
        }
        Ok(())
    }

    fn groups(&self, collection: Collection) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(self.dir(collection)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut groups = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(group) = entry.file_name().to_str() {
                if validate_segment(group).is_ok() {
                    groups.push(group.to_string());
                }
            }
        }
        Ok(groups)
    }

    fn list_group(&self, collection: Collection, group: &str) -> StoreResult<Vec<ArtifactName>> {
        Self::list_json_files(&self.group_dir(collection, group)?)
    }

    fn read_group(
        &self,
        collection: Collection,
        group: &str,
        name: &ArtifactName,
    ) -> StoreResult<Vec<u8>> {
        let path = self.group_dir(collection, group)?.join(name.as_str());
        Self::read_file(&path, collection, name)
    }
}
