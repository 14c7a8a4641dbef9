//! Configuration types for the replay proxy.
//!
//! Loaded once at startup (YAML file plus CLI overrides) and passed into the
//! server, engine and store constructors.

mod listen;
mod matching;
mod recording;
mod storage;
mod upstream;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;
pub use matching::{MatchStrategy, MatchingConfig};
pub use recording::RecordingConfig;
pub use storage::StorageConfig;
pub use upstream::{ConnectionPoolConfig, UpstreamConfig};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upstream.request_timeout_secs == 0 {
            anyhow::bail!("upstream.request_timeout_secs must be greater than zero");
        }

        if self.upstream.connection_pool.connect_timeout_secs == 0 {
            anyhow::bail!("upstream.connection_pool.connect_timeout_secs must be greater than zero");
        }

        if self.storage.logs_path() == self.storage.mocks_path() {
            anyhow::bail!(
                "storage.logs_dir and storage.mocks_dir must differ (both resolve to '{}')",
                self.storage.logs_path().display()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listen.port, 3000);
        assert_eq!(config.storage.logs_path(), PathBuf::from("./logs"));
        assert_eq!(config.storage.mocks_path(), PathBuf::from("./mocked"));
        assert_eq!(config.matching.strategy, MatchStrategy::FullUrl);
        assert!(config.recording.record_mock_hits);
        assert!(config.recording.keyword_map.is_none());
        assert_eq!(config.upstream.request_timeout_secs, 30);
        assert!(!config.upstream.tls_skip_verify);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listen:
  host: 127.0.0.1
  port: 8088
storage:
  root: /var/lib/replay
  logs_dir: observed
  mocks_dir: canned
matching:
  strategy: folderSubstring
recording:
  record_mock_hits: false
  keyword_map: keywords.json
upstream:
  request_timeout_secs: 5
  tls_skip_verify: true
  connection_pool:
    max_idle_per_host: 4
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.socket_addr().to_string(), "127.0.0.1:8088");
        assert_eq!(
            config.storage.logs_path(),
            PathBuf::from("/var/lib/replay/observed")
        );
        assert_eq!(
            config.storage.mocks_path(),
            PathBuf::from("/var/lib/replay/canned")
        );
        assert_eq!(config.matching.strategy, MatchStrategy::FolderSubstring);
        assert!(!config.recording.record_mock_hits);
        assert_eq!(
            config.recording.keyword_map,
            Some(PathBuf::from("keywords.json"))
        );
        assert_eq!(config.upstream.request_timeout().as_secs(), 5);
        assert!(config.upstream.tls_skip_verify);
        assert_eq!(config.upstream.connection_pool.max_idle_per_host, 4);
        assert_eq!(config.upstream.connection_pool.connect_timeout_secs, 10);
    }

    #[test]
    fn test_absolute_dirs_ignore_root() {
        let yaml = r#"
storage:
  root: /srv
  logs_dir: /tmp/logs
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.logs_path(), PathBuf::from("/tmp/logs"));
        assert_eq!(config.storage.mocks_path(), PathBuf::from("/srv/mocked"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.upstream.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_directory() {
        let mut config = Config::default();
        config.storage.mocks_dir = PathBuf::from("logs");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let yaml = "matching:\n  strategy: fuzzy\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen:\n  port: 9999").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen.port, 9999);
    }
}
