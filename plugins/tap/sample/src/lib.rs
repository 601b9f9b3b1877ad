use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use singer_api::{
    Channels, ConnectorConfig, ConnectorError, Message, Plugin, PluginOptions, RecordMessage,
    SchemaMessage, SecretString, Tap,
};

pub mod config;

use config::SampleTapConfig;

/// 2024-01-01T00:00:00Z. Row `i` is stamped `i` minutes later.
const BASE_TIMESTAMP: i64 = 1_704_067_200;

/// Deterministic tap: generates `streams[name]` rows per configured stream.
pub struct SampleTap {
    config: SampleTapConfig,
    api_key: Option<SecretString>,
    fail_connection: bool,
    bookmarks: BTreeMap<String, Map<String, Value>>,
}

impl SampleTap {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" },
                "updated_at": { "type": "string", "format": "date-time" },
            },
        })
    }

    fn row(stream: &str, i: u64) -> Result<Value, ConnectorError> {
        let ts = DateTime::<Utc>::from_timestamp(BASE_TIMESTAMP + (i as i64) * 60, 0)
            .ok_or_else(|| ConnectorError::sync(format!("row {i} is out of range")).for_stream(stream))?;
        Ok(json!({
            "id": i,
            "name": format!("{stream}-{i}"),
            "updated_at": ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        }))
    }

    fn state_message(&self) -> Message {
        Message::state(json!({ "bookmarks": self.bookmarks }))
    }

    fn increment_state(&mut self, stream: &str, record: &Value) {
        let entry = self.bookmarks.entry(stream.to_string()).or_default();
        if let Some(ref key) = self.config.replication_key {
            entry.insert("replication_key".into(), Value::String(key.clone()));
            entry.insert(
                "replication_key_value".into(),
                record.get(key).cloned().unwrap_or(Value::Null),
            );
        }
    }

    fn sync_stream(
        &mut self,
        stream: &str,
        count: u64,
        channels: &mut Channels<'_>,
    ) -> Result<(), ConnectorError> {
        let method = self.config.replication_method();
        channels.log(format!("Beginning {method} sync of stream '{stream}'..."))?;
        tracing::info!(stream, method, rows = count, "syncing stream");

        channels.emit(&Message::Schema(SchemaMessage {
            stream: stream.to_string(),
            schema: Self::schema(),
            key_properties: vec!["id".into()],
            bookmark_properties: self.config.replication_key.clone().map(|k| vec![k]),
        }))?;

        self.bookmarks.entry(stream.to_string()).or_default();
        let mut rows_sent: u64 = 0;
        for i in 0..count {
            if rows_sent > 0 && (rows_sent - 1) % self.config.state_frequency == 0 {
                channels.emit(&self.state_message())?;
            }
            let record = Self::row(stream, i)?;
            channels.emit(&Message::Record(RecordMessage {
                stream: stream.to_string(),
                record: record.clone(),
                version: None,
                time_extracted: Some(Utc::now().to_rfc3339()),
            }))?;
            self.increment_state(stream, &record);
            rows_sent += 1;
        }

        channels.log(format!("Completed '{stream}' sync ({rows_sent} records)."))?;
        channels.emit(&self.state_message())
    }
}

impl Plugin for SampleTap {
    const NAME: &'static str = "tap-sample";

    fn create(config: ConnectorConfig, options: &PluginOptions) -> Result<Self, ConnectorError> {
        let cfg = SampleTapConfig::from_connector_config(&config)?;
        Ok(Self {
            api_key: config.get_secret("api_key"),
            config: cfg,
            fail_connection: options.get_bool("fail_connection").unwrap_or(false),
            bookmarks: BTreeMap::new(),
        })
    }
}

impl Tap for SampleTap {
    fn discover(&mut self) -> Result<String, ConnectorError> {
        let streams: Vec<Value> = self
            .config
            .streams
            .keys()
            .map(|name| {
                json!({
                    "tap_stream_id": name,
                    "stream": name,
                    "schema": Self::schema(),
                    "key_properties": ["id"],
                    "replication_key": self.config.replication_key,
                    "replication_method": self.config.replication_method(),
                })
            })
            .collect();
        Ok(serde_json::to_string_pretty(&json!({ "streams": streams }))?)
    }

    fn test_connection(&mut self) -> Result<bool, ConnectorError> {
        if self.fail_connection {
            return Ok(false);
        }
        Ok(self.api_key.as_ref().is_none_or(|key| !key.expose().is_empty()))
    }

    fn sync_all(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError> {
        let streams: Vec<(String, u64)> = self
            .config
            .streams
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        for (stream, count) in streams {
            self.sync_stream(&stream, count, channels)?;
        }
        Ok(())
    }
}
