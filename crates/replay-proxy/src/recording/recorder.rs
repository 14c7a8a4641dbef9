//! Builds interaction records and persists them to the log collection.

use super::artifact::{artifact_name, fallback_name, fingerprint};
use super::keyword::KeywordSource;
use super::types::{round_cost, InteractionRecord, RecordedResponse};
use crate::metrics;
use crate::store::{ArtifactName, ArtifactStore, Collection, StoreError};
use chrono::{DateTime, Local};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Request side of an interaction, captured before dispatch.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub started_at: DateTime<Local>,
    pub method: String,
    pub full_url: String,
    /// Inbound path, with or without the leading `/`
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// Response side of an interaction.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    /// Dispatch-to-response time; `None` for responses that never left the proxy
    pub elapsed: Option<Duration>,
}

/// Where a record ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Written(ArtifactName),
    /// The primary write failed; a diagnostic artifact was written instead
    Fallback(ArtifactName),
    Failed,
}

impl RecordOutcome {
    pub fn artifact(&self) -> Option<&ArtifactName> {
        match self {
            RecordOutcome::Written(name) | RecordOutcome::Fallback(name) => Some(name),
            RecordOutcome::Failed => None,
        }
    }
}

/// Writes one JSON document per interaction into the log collection.
///
/// Persistence failures never propagate: the caller's HTTP response does not
/// depend on whether the record could be written.
pub struct InteractionRecorder {
    store: Arc<dyn ArtifactStore>,
    keywords: KeywordSource,
}

impl InteractionRecorder {
    pub fn new(store: Arc<dyn ArtifactStore>, keywords: KeywordSource) -> Self {
        Self { store, keywords }
    }

    /// Assemble the record without persisting it.
    pub fn build_record(&self, request: &RequestInfo, response: ResponseInfo) -> InteractionRecord {
        let path = request.path.trim_start_matches('/').to_string();
        InteractionRecord {
            timestamp: request
                .started_at
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            method: request.method.clone(),
            full_url: request.full_url.clone(),
            keyword: self.keywords.derive(&path, &request.body),
            path,
            query: request.query.clone().filter(|q| !q.is_empty()),
            headers: request.headers.clone(),
            body: request.body.clone(),
            cost: response.elapsed.map(|d| round_cost(d.as_secs_f64())),
            response: RecordedResponse {
                status_code: response.status_code,
                headers: response.headers,
                body: response.body,
            },
        }
    }

    /// Build and persist a record, returning where it was written.
    pub fn record(&self, request: &RequestInfo, response: ResponseInfo) -> RecordOutcome {
        let record = self.build_record(request, response);
        let name = match artifact_name(
            request.started_at.timestamp_millis(),
            &fingerprint(&record.method, &record.full_url, &record.body),
        ) {
            Ok(name) => name,
            Err(e) => {
                error!("Failed to name interaction record: {}", e);
                metrics::record_artifact_write("failed");
                return RecordOutcome::Failed;
            }
        };

        match self.write_record(&name, &record) {
            Ok(()) => {
                debug!("Recorded {} {} as {}", record.method, record.full_url, name);
                metrics::record_artifact_write("ok");
                RecordOutcome::Written(name)
            }
            Err(e) => {
                warn!("Failed to write interaction record {}: {}", name, e);
                self.write_fallback(&name, &record, &e.to_string())
            }
        }
    }

    fn write_record(&self, name: &ArtifactName, record: &InteractionRecord) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(record)?;
        self.store.write(Collection::Log, name, &contents)
    }

    fn write_fallback(
        &self,
        primary: &ArtifactName,
        record: &InteractionRecord,
        message: &str,
    ) -> RecordOutcome {
        let written = fallback_name(primary).and_then(|name| {
            let document = json!({
                "error": message,
                "record": record,
            });
            let contents = serde_json::to_vec_pretty(&document)?;
            self.store.write(Collection::Log, &name, &contents)?;
            Ok(name)
        });

        match written {
            Ok(name) => {
                metrics::record_artifact_write("fallback");
                RecordOutcome::Fallback(name)
            }
            Err(e) => {
                error!("Failed to write fallback record for {}: {}", primary, e);
                metrics::record_artifact_write("failed");
                RecordOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryArtifactStore;
    use crate::recording::KeywordMap;
    use crate::store::StoreResult;
    use chrono::TimeZone;

    fn request(path: &str, body: Value) -> RequestInfo {
        RequestInfo {
            started_at: Local.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            method: "POST".to_string(),
            full_url: format!("https://api.example.com{path}"),
            path: path.to_string(),
            query: None,
            headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            body,
        }
    }

    fn ok_response() -> ResponseInfo {
        ResponseInfo {
            status_code: 200,
            headers: BTreeMap::new(),
            body: json!({"ok": true}),
            elapsed: Some(Duration::from_micros(123_456)),
        }
    }

    fn read_record(store: &InMemoryArtifactStore, name: &ArtifactName) -> InteractionRecord {
        serde_json::from_slice(&store.read(Collection::Log, name).unwrap()).unwrap()
    }

    #[test]
    fn test_record_writes_pretty_json_to_log() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let recorder = InteractionRecorder::new(store.clone(), KeywordSource::Disabled);

        let outcome = recorder.record(&request("/users", json!({})), ok_response());
        let RecordOutcome::Written(name) = outcome else {
            panic!("expected written record, got {outcome:?}");
        };

        assert!(name.as_str().starts_with("1700000000123_"));
        let raw = store.read(Collection::Log, &name).unwrap();
        assert!(raw.starts_with(b"{\n  \""));

        let record = read_record(&store, &name);
        assert_eq!(record.method, "POST");
        assert_eq!(record.full_url, "https://api.example.com/users");
        assert_eq!(record.path, "users");
        assert_eq!(record.cost, Some(0.1235));
        assert_eq!(record.response.status_code, 200);
        assert!(record.keyword.is_none());
        assert!(store.is_empty(Collection::Mock));
    }

    #[test]
    fn test_non_ascii_preserved() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let recorder = InteractionRecorder::new(store.clone(), KeywordSource::Disabled);

        let outcome = recorder.record(&request("/greet", json!({"name": "张三"})), ok_response());
        let raw = store.read(Collection::Log, outcome.artifact().unwrap()).unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("张三"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_keyword_derivation() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let map = KeywordMap::from_value(json!({"/login": "username"})).unwrap();
        let recorder = InteractionRecorder::new(store.clone(), KeywordSource::Static(map));

        let hit = recorder.record(&request("/login", json!({"username": "alice"})), ok_response());
        assert_eq!(
            read_record(&store, hit.artifact().unwrap()).keyword.as_deref(),
            Some("username: alice")
        );

        let miss = recorder.record(&request("/login", json!({"other": "x"})), ok_response());
        assert_eq!(read_record(&store, miss.artifact().unwrap()).keyword, None);
    }

    #[test]
    fn test_distinct_bodies_same_millisecond_get_distinct_names() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let recorder = InteractionRecorder::new(store.clone(), KeywordSource::Disabled);

        let a = recorder.record(&request("/x", json!({"a": 1})), ok_response());
        let b = recorder.record(&request("/x", json!({"a": 2})), ok_response());
        assert_ne!(a.artifact(), b.artifact());
        assert_eq!(store.len(Collection::Log), 2);
    }

    #[test]
    fn test_mock_hit_record_has_no_cost() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let recorder = InteractionRecorder::new(store, KeywordSource::Disabled);
        let mut response = ok_response();
        response.elapsed = None;

        let record = recorder.build_record(&request("/users", json!({})), response);
        assert!(record.cost.is_none());
        assert!(serde_json::to_value(&record).unwrap().get("cost").is_none());
    }

    /// Store whose primary writes fail; fallback names are accepted unless
    /// `fail_all` is set.
    struct FailingStore {
        inner: InMemoryArtifactStore,
        fail_all: bool,
    }

    impl ArtifactStore for FailingStore {
        fn list(&self, c: Collection) -> StoreResult<Vec<ArtifactName>> {
            self.inner.list(c)
        }
        fn read(&self, c: Collection, n: &ArtifactName) -> StoreResult<Vec<u8>> {
            self.inner.read(c, n)
        }
        fn write(&self, c: Collection, n: &ArtifactName, contents: &[u8]) -> StoreResult<()> {
            if self.fail_all || !n.as_str().ends_with("_fallback.json") {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.write(c, n, contents)
        }
        fn delete(&self, c: Collection, n: &ArtifactName) -> StoreResult<()> {
            self.inner.delete(c, n)
        }
        fn move_between(&self, n: &ArtifactName, f: Collection, t: Collection) -> StoreResult<()> {
            self.inner.move_between(n, f, t)
        }
        fn groups(&self, c: Collection) -> StoreResult<Vec<String>> {
            self.inner.groups(c)
        }
        fn list_group(&self, c: Collection, g: &str) -> StoreResult<Vec<ArtifactName>> {
            self.inner.list_group(c, g)
        }
        fn read_group(&self, c: Collection, g: &str, n: &ArtifactName) -> StoreResult<Vec<u8>> {
            self.inner.read_group(c, g, n)
        }
    }

    #[test]
    fn test_write_failure_uses_fallback() {
        let store = Arc::new(FailingStore {
            inner: InMemoryArtifactStore::new(),
            fail_all: false,
        });
        let recorder = InteractionRecorder::new(store.clone(), KeywordSource::Disabled);

        let outcome = recorder.record(&request("/users", json!({})), ok_response());
        let RecordOutcome::Fallback(name) = outcome else {
            panic!("expected fallback, got {outcome:?}");
        };

        let doc: Value =
            serde_json::from_slice(&store.inner.read(Collection::Log, &name).unwrap()).unwrap();
        assert!(doc["error"].as_str().unwrap().contains("disk full"));
        assert_eq!(doc["record"]["full-url"], "https://api.example.com/users");
    }

    #[test]
    fn test_total_write_failure_is_absorbed() {
        let store = Arc::new(FailingStore {
            inner: InMemoryArtifactStore::new(),
            fail_all: true,
        });
        let recorder = InteractionRecorder::new(store, KeywordSource::Disabled);

        let outcome = recorder.record(&request("/users", json!({})), ok_response());
        assert_eq!(outcome, RecordOutcome::Failed);
        assert!(outcome.artifact().is_none());
    }
}
