//! Interaction recording configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Write a synthetic record when a request is answered from a mock
    #[serde(default = "default_record_mock_hits")]
    pub record_mock_hits: bool,

    /// Path -> body field mapping used to derive a record's `keyword`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_map: Option<PathBuf>,
}

fn default_record_mock_hits() -> bool {
    true
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            record_mock_hits: default_record_mock_hits(),
            keyword_map: None,
        }
    }
}
