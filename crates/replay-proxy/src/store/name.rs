//! Validated artifact names.

use super::StoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Extension every stored artifact carries.
pub const ARTIFACT_EXTENSION: &str = ".json";

/// A single path segment naming an artifact inside a collection.
///
/// Construction rejects anything that could resolve outside the collection
/// directory: empty names, separators, `.`/`..` and absolute paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        validate_segment(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name has the `.json` artifact extension.
    pub fn is_json(&self) -> bool {
        self.0.ends_with(ARTIFACT_EXTENSION)
    }

    /// Name without the `.json` extension.
    pub fn stem(&self) -> &str {
        self.0.strip_suffix(ARTIFACT_EXTENSION).unwrap_or(&self.0)
    }

    /// Millisecond timestamp encoded before the first `_`, if any.
    pub fn timestamp_prefix(&self) -> Option<u64> {
        let prefix = self.stem().split('_').next()?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok()
    }

    /// Creation-order key: numeric timestamp prefix, then the full name.
    /// Names without a numeric prefix sort as the oldest.
    pub fn order_key(&self) -> (u64, &str) {
        (self.timestamp_prefix().unwrap_or(0), self.as_str())
    }

    /// Whether this artifact was created strictly after `other`.
    pub fn is_newer_than(&self, other: &ArtifactName) -> bool {
        self.order_key() > other.order_key()
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArtifactName {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactName> for String {
    fn from(name: ArtifactName) -> Self {
        name.0
    }
}

impl PartialOrd for ArtifactName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArtifactName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

/// Sort names newest first by numeric timestamp prefix.
pub fn newest_first(names: &mut [ArtifactName]) {
    names.sort_by(|a, b| b.cmp(a));
}

/// Reject anything that is not a plain, single path segment.
pub(crate) fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains('\0')
        || segment.starts_with('~');
    if invalid {
        return Err(StoreError::InvalidName(segment.to_string()));
    }
    Ok(())
}
