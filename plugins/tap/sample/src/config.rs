use std::collections::BTreeMap;

use singer_api::{ConnectorConfig, ConnectorError};

fn default_state_frequency() -> u64 {
    10_000
}

#[derive(Debug, serde::Deserialize)]
pub struct SampleTapConfig {
    /// Stream name → number of rows to generate.
    pub streams: BTreeMap<String, u64>,
    /// Row field used as the incremental bookmark. Must be `updated_at` or `id`.
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Emit an interim STATE every this many records.
    #[serde(default = "default_state_frequency")]
    pub state_frequency: u64,
}

impl SampleTapConfig {
    pub fn from_connector_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let cfg: SampleTapConfig = serde_json::from_value(config.clone().into_value())
            .map_err(|e| ConnectorError::config(e.to_string()))?;

        if cfg.state_frequency == 0 {
            return Err(ConnectorError::config("state_frequency must be positive"));
        }
        if let Some(ref key) = cfg.replication_key {
            if key != "updated_at" && key != "id" {
                return Err(ConnectorError::config(format!(
                    "replication_key '{key}' is not a property of the sample streams"
                )));
            }
        }
        Ok(cfg)
    }

    pub fn replication_method(&self) -> &'static str {
        if self.replication_key.is_some() {
            "INCREMENTAL"
        } else {
            "FULL_TABLE"
        }
    }
}
