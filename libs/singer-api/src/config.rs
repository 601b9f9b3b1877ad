use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConnectorError;
use crate::secrets::{is_common_secret_key, SecretString};

/// Typed getters over a JSON object map.
///
/// Settings arrive as loosely typed JSON; connectors read them through these
/// getters instead of matching on `Value` themselves.
macro_rules! impl_typed_getters {
    ($name:ident) => {
        impl $name {
            pub fn get(&self, name: &str) -> Option<&Value> {
                self.values.get(name)
            }

            pub fn contains(&self, name: &str) -> bool {
                self.values.contains_key(name)
            }

            pub fn get_bool(&self, name: &str) -> Option<bool> {
                self.get(name).and_then(Value::as_bool)
            }

            pub fn get_i64(&self, name: &str) -> Option<i64> {
                self.get(name).and_then(Value::as_i64)
            }

            pub fn get_u64(&self, name: &str) -> Option<u64> {
                self.get(name).and_then(Value::as_u64)
            }

            pub fn get_str(&self, name: &str) -> Option<&str> {
                self.get(name).and_then(Value::as_str)
            }

            pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
                self.values.insert(name.into(), value.into());
            }

            /// Builder form of [`Self::set`].
            pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
                self.set(name, value);
                self
            }

            pub fn len(&self) -> usize {
                self.values.len()
            }

            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }
        }
    };
}

// ════════════════════════════════════════════════════════════════
//  ConnectorConfig
// ════════════════════════════════════════════════════════════════

/// Connector configuration: the JSON object a tap or target is created with.
///
/// `Debug` output replaces the values of secret settings with `***`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorConfig {
    values: Map<String, Value>,
}

impl_typed_getters!(ConnectorConfig);

impl ConnectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, ConnectorError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ConnectorError::config(format!(
                "config must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConnectorError> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| ConnectorError::config(format!("invalid JSON config: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConnectorError> {
        let value: Value = toml::from_str(s)
            .map_err(|e| ConnectorError::config(format!("invalid TOML config: {e}")))?;
        Self::from_value(value)
    }

    /// Load a config file. `.toml` files are parsed as TOML, everything else
    /// as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::config(format!("'{}': {e}", path.display())))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        let config = config.map_err(|e| e.with_context(path.display()))?;
        tracing::debug!(path = %path.display(), settings = config.len(), "loaded connector config");
        Ok(config)
    }

    /// Read a secret setting. Returns `None` when absent or not a string.
    pub fn get_secret(&self, name: &str) -> Option<SecretString> {
        self.get_str(name).map(SecretString::from)
    }

    /// All settings except secrets.
    pub fn params(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(k, _)| !is_common_secret_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.values {
            if is_common_secret_key(k) {
                map.entry(k, &"***");
            } else {
                map.entry(k, v);
            }
        }
        map.finish()
    }
}

// ════════════════════════════════════════════════════════════════
//  PluginOptions
// ════════════════════════════════════════════════════════════════

/// Keyword arguments passed to a connector next to its config
/// (e.g. `parse_env_config`, `validate_config`, test switches).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginOptions {
    values: Map<String, Value>,
}

impl_typed_getters!(PluginOptions);

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object() {
        let err = ConnectorConfig::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(err.message().contains("an array"));
    }

    #[test]
    fn typed_getters() {
        let config = ConnectorConfig::from_value(json!({
            "host": "localhost",
            "port": 5432,
            "ssl": true,
            "offset": -3,
        }))
        .unwrap();
        assert_eq!(config.get_str("host"), Some("localhost"));
        assert_eq!(config.get_u64("port"), Some(5432));
        assert_eq!(config.get_bool("ssl"), Some(true));
        assert_eq!(config.get_u64("offset"), None);
        assert_eq!(config.get_i64("offset"), Some(-3));
        assert_eq!(config.get_str("port"), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = ConnectorConfig::new()
            .with("username", "alice")
            .with("password", "hunter2");
        let dbg = format!("{config:?}");
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn params_exclude_secrets() {
        let config = ConnectorConfig::new()
            .with("start_date", "2024-01-01")
            .with("client_secret", "abc")
            .with("aws_access_key_id", "AKIA");
        let params = config.params();
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("start_date"));
        assert_eq!(config.get_secret("client_secret").unwrap().expose(), "abc");
    }

    #[test]
    fn load_toml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("config.toml");
        std::fs::write(&toml_path, "state_frequency = 5\n[streams]\nusers = 3\n").unwrap();
        let config = ConnectorConfig::load(&toml_path).unwrap();
        assert_eq!(config.get_u64("state_frequency"), Some(5));
        assert_eq!(config.get("streams"), Some(&json!({"users": 3})));

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"streams": {"orders": 2}}"#).unwrap();
        let config = ConnectorConfig::load(&json_path).unwrap();
        assert_eq!(config.get("streams"), Some(&json!({"orders": 2})));
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let err = ConnectorConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(err.context()[0].ends_with("bad.json"));
        assert!(err.to_string().contains("bad.json: invalid JSON config"));
    }

    #[test]
    fn options_builder() {
        let options = PluginOptions::new().with("validate_config", false);
        assert_eq!(options.get_bool("validate_config"), Some(false));
        assert!(!options.is_empty());
    }
}
