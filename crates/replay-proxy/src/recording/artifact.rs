//! Artifact naming: `{millisecond timestamp}_{fingerprint}.json`.

use crate::store::{ArtifactName, StoreError};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Width the millisecond timestamp is zero-padded to. 13 digits covers every
/// instant up to the year 2286, so string order and numeric order agree.
pub const TIMESTAMP_WIDTH: usize = 13;

/// Hex characters of the SHA-256 digest kept in the filename.
const FINGERPRINT_LEN: usize = 16;

/// Short stable identifier of a request's defining fields.
pub fn fingerprint(method: &str, url: &str, body: &Value) -> String {
    let canonical = json!({
        "method": method,
        "url": url,
        "body": body,
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}

/// Artifact name for a record captured at `timestamp_ms`.
pub fn artifact_name(timestamp_ms: i64, fingerprint: &str) -> Result<ArtifactName, StoreError> {
    ArtifactName::new(format!(
        "{:0width$}_{}.json",
        timestamp_ms.max(0),
        fingerprint,
        width = TIMESTAMP_WIDTH
    ))
}

/// Name of the diagnostic artifact written when the primary write fails.
pub fn fallback_name(primary: &ArtifactName) -> Result<ArtifactName, StoreError> {
    ArtifactName::new(format!("{}_fallback.json", primary.stem()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = fingerprint("POST", "https://api.example.com/login", &json!({"u": "alice"}));
        let b = fingerprint("POST", "https://api.example.com/login", &json!({"u": "alice"}));
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_covers_all_fields() {
        let base = fingerprint("GET", "https://a/x", &json!({}));
        assert_ne!(base, fingerprint("POST", "https://a/x", &json!({})));
        assert_ne!(base, fingerprint("GET", "https://a/y", &json!({})));
        assert_ne!(base, fingerprint("GET", "https://a/x", &json!({"k": 1})));
    }

    #[test]
    fn test_artifact_name_zero_padded() {
        let name = artifact_name(42, "abcd").unwrap();
        assert_eq!(name.as_str(), "0000000000042_abcd.json");
        assert_eq!(name.timestamp_prefix(), Some(42));

        let name = artifact_name(1_700_000_000_123, "ff").unwrap();
        assert_eq!(name.as_str(), "1700000000123_ff.json");
    }

    #[test]
    fn test_padded_names_sort_like_numbers() {
        let older = artifact_name(999, "a").unwrap();
        let newer = artifact_name(1000, "a").unwrap();
        assert!(older.as_str() < newer.as_str());
        assert!(newer.is_newer_than(&older));
    }

    #[test]
    fn test_fallback_name() {
        let primary = artifact_name(5, "beef").unwrap();
        let fallback = fallback_name(&primary).unwrap();
        assert_eq!(fallback.as_str(), "0000000000005_beef_fallback.json");
        assert_eq!(fallback.timestamp_prefix(), Some(5));
    }
}
