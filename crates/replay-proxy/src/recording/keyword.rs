//! Keyword derivation from an external path -> field-name mapping.
//!
//! The mapping document is either a flat object or a list of single-entry
//! objects:
//!
//! ```json
//! {"/login": "username"}
//! [{"/login": "username"}, {"/orders": "orderId"}]
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    #[error("failed to read keyword map {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("keyword map is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyword map must be an object or a list of objects, found {0}")]
    Shape(&'static str),
    #[error("keyword map entry for {0:?} must map to a string field name")]
    FieldName(String),
}

/// Request path -> body field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordMap {
    fields: HashMap<String, String>,
}

impl KeywordMap {
    pub fn load(path: &Path) -> Result<Self, KeywordError> {
        let contents = std::fs::read(path).map_err(|source| KeywordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(serde_json::from_slice(&contents)?)
    }

    pub fn from_value(value: Value) -> Result<Self, KeywordError> {
        let mut map = Self::default();
        match value {
            Value::Object(entries) => map.extend(entries)?,
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(entries) => map.extend(entries)?,
                        other => return Err(KeywordError::Shape(json_type(&other))),
                    }
                }
            }
            other => return Err(KeywordError::Shape(json_type(&other))),
        }
        Ok(map)
    }

    fn extend(&mut self, entries: serde_json::Map<String, Value>) -> Result<(), KeywordError> {
        for (path, field) in entries {
            let Value::String(field) = field else {
                return Err(KeywordError::FieldName(path));
            };
            self.fields.insert(normalize_path(&path), field);
        }
        Ok(())
    }

    /// Field name configured for a request path.
    pub fn field_for(&self, path: &str) -> Option<&str> {
        self.fields.get(&normalize_path(path)).map(String::as_str)
    }

    /// `"<field>: <value>"` when the path is mapped and the body has the field.
    pub fn keyword_for(&self, path: &str, body: &Value) -> Option<String> {
        let field = self.field_for(path)?;
        let value = body.as_object()?.get(field)?;
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(format!("{field}: {rendered}"))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where the recorder gets its keyword map from.
#[derive(Debug, Clone, Default)]
pub enum KeywordSource {
    /// No keywords are derived
    #[default]
    Disabled,
    /// Re-read on every record so edits apply without a restart
    File(PathBuf),
    Static(KeywordMap),
}

impl KeywordSource {
    /// Derive a keyword, degrading every mapping problem to "no keyword".
    pub fn derive(&self, path: &str, body: &Value) -> Option<String> {
        match self {
            KeywordSource::Disabled => None,
            KeywordSource::Static(map) => map.keyword_for(path, body),
            KeywordSource::File(file) => match KeywordMap::load(file) {
                Ok(map) => map.keyword_for(path, body),
                Err(e) => {
                    warn!("Keyword map unavailable, recording without keyword: {}", e);
                    None
                }
            },
        }
    }
}

fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn login_map() -> KeywordMap {
        KeywordMap::from_value(json!({"/login": "username"})).unwrap()
    }

    #[test]
    fn test_keyword_from_flat_map() {
        let map = login_map();
        assert_eq!(
            map.keyword_for("/login", &json!({"username": "alice"})),
            Some("username: alice".to_string())
        );
    }

    #[test]
    fn test_keyword_absent_without_field() {
        let map = login_map();
        assert_eq!(map.keyword_for("/login", &json!({"other": "x"})), None);
        assert_eq!(map.keyword_for("/logout", &json!({"username": "alice"})), None);
        assert_eq!(map.keyword_for("/login", &json!(["username"])), None);
    }

    #[test]
    fn test_list_of_single_entry_objects() {
        let map = KeywordMap::from_value(json!([
            {"/login": "username"},
            {"orders": "orderId"}
        ]))
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.field_for("/orders"), Some("orderId"));
        assert_eq!(map.field_for("login"), Some("username"));
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let map = KeywordMap::from_value(json!({"/orders": "orderId"})).unwrap();
        assert_eq!(
            map.keyword_for("/orders", &json!({"orderId": 42})),
            Some("orderId: 42".to_string())
        );
    }

    #[test]
    fn test_malformed_maps_rejected() {
        assert!(matches!(
            KeywordMap::from_value(json!("nope")),
            Err(KeywordError::Shape("string"))
        ));
        assert!(matches!(
            KeywordMap::from_value(json!([1])),
            Err(KeywordError::Shape("number"))
        ));
        assert!(matches!(
            KeywordMap::from_value(json!({"/login": 1})),
            Err(KeywordError::FieldName(_))
        ));
    }

    #[test]
    fn test_file_source_degrades_to_none() {
        let missing = KeywordSource::File(PathBuf::from("/nonexistent/keywords.json"));
        assert_eq!(missing.derive("/login", &json!({"username": "a"})), None);

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        write!(garbage, "{{not json").unwrap();
        let source = KeywordSource::File(garbage.path().to_path_buf());
        assert_eq!(source.derive("/login", &json!({"username": "a"})), None);
    }

    #[test]
    fn test_file_source_reads_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"/login": "username"}}]"#).unwrap();
        let source = KeywordSource::File(file.path().to_path_buf());
        assert_eq!(
            source.derive("/login", &json!({"username": "bob"})),
            Some("username: bob".to_string())
        );
    }
}
