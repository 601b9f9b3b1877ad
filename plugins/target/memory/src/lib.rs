use std::collections::BTreeMap;
use std::io::BufRead;

use serde_json::Value;

use singer_api::{
    Channels, ConnectorConfig, ConnectorError, Message, Plugin, PluginOptions, SchemaMessage,
    Target,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryTargetConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_batch() -> usize {
    10_000
}

#[derive(Debug, serde::Deserialize)]
pub struct MemoryTargetConfig {
    /// Drain once this many records are buffered.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for MemoryTargetConfig {
    fn default() -> Self {
        Self {
            max_batch: default_max_batch(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryTarget
// ═══════════════════════════════════════════════════════════════

/// Loads records into in-memory tables. State is echoed back only after the
/// records that preceded it have been drained.
pub struct MemoryTarget {
    max_batch: usize,
    schemas: BTreeMap<String, SchemaMessage>,
    pending: Vec<(String, Value)>,
    tables: BTreeMap<String, Vec<Value>>,
    latest_state: Option<Value>,
    state_dirty: bool,
    lines_read: u64,
}

impl MemoryTarget {
    pub fn new(config: MemoryTargetConfig) -> Self {
        Self {
            max_batch: config.max_batch,
            schemas: BTreeMap::new(),
            pending: Vec::new(),
            tables: BTreeMap::new(),
            latest_state: None,
            state_dirty: false,
            lines_read: 0,
        }
    }

    pub fn table(&self, stream: &str) -> &[Value] {
        self.tables.get(stream).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn records_loaded(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    fn handle(&mut self, message: Message, channels: &mut Channels<'_>) -> Result<(), ConnectorError> {
        match message {
            Message::Schema(schema) => {
                self.schemas.insert(schema.stream.clone(), schema);
            }
            Message::Record(record) => {
                if !self.schemas.contains_key(&record.stream) {
                    return Err(ConnectorError::protocol("RECORD received before its SCHEMA")
                        .for_stream(record.stream));
                }
                self.pending.push((record.stream, record.record));
                if self.pending.len() >= self.max_batch {
                    self.drain(channels)?;
                }
            }
            Message::State(state) => {
                self.latest_state = Some(state.value);
                self.state_dirty = true;
            }
            Message::ActivateVersion(av) => {
                tracing::debug!(stream = %av.stream, version = av.version, "ignoring ACTIVATE_VERSION");
            }
        }
        Ok(())
    }

    /// Move pending records into their tables, then emit the latest state
    /// if it changed since the last drain.
    fn drain(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError> {
        let drained = self.pending.len();
        for (stream, record) in self.pending.drain(..) {
            self.tables.entry(stream).or_default().push(record);
        }
        tracing::debug!(records = drained, "drained pending records");

        if self.state_dirty {
            if let Some(ref state) = self.latest_state {
                channels.emit(&Message::state(state.clone()))?;
            }
            self.state_dirty = false;
        }
        Ok(())
    }
}

impl Plugin for MemoryTarget {
    const NAME: &'static str = "target-memory";

    fn create(config: ConnectorConfig, _options: &PluginOptions) -> Result<Self, ConnectorError> {
        let cfg: MemoryTargetConfig = if config.is_empty() {
            MemoryTargetConfig::default()
        } else {
            serde_json::from_value(config.into_value())
                .map_err(|e| ConnectorError::config(e.to_string()))?
        };
        if cfg.max_batch == 0 {
            return Err(ConnectorError::config("max_batch must be positive"));
        }
        Ok(Self::new(cfg))
    }
}

impl Target for MemoryTarget {
    fn process_lines(
        &mut self,
        input: &mut dyn BufRead,
        channels: &mut Channels<'_>,
    ) -> Result<(), ConnectorError> {
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            self.lines_read += 1;
            if line.trim().is_empty() {
                continue;
            }
            let message = Message::from_line(line.trim_end_matches('\n'))
                .map_err(|e| e.at_line(self.lines_read))?;
            self.handle(message, channels)?;
        }
        Ok(())
    }

    fn process_endofpipe(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError> {
        self.drain(channels)?;
        channels.log(format!(
            "{}: loaded {} records into {} streams",
            Self::NAME,
            self.records_loaded(),
            self.tables.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    const INPUT: &str = r#"{"type":"SCHEMA","stream":"users","schema":{},"key_properties":["id"]}
{"type":"RECORD","stream":"users","record":{"id":1}}
{"type":"STATE","value":{"n":1}}
{"type":"RECORD","stream":"users","record":{"id":2}}
"#;

    fn run(target: &mut MemoryTarget, input: &str, finalize: bool) -> Result<String, ConnectorError> {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut channels = Channels::new(&mut out, &mut err);
        target.process_lines(&mut Cursor::new(input), &mut channels)?;
        if finalize {
            target.process_endofpipe(&mut channels)?;
        }
        drop(channels);
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn state_waits_for_drain() {
        let mut target = MemoryTarget::new(MemoryTargetConfig::default());
        assert_eq!(run(&mut target, INPUT, false).unwrap(), "");
        assert_eq!(target.records_loaded(), 0);

        let out = run(&mut target, "", true).unwrap();
        assert_eq!(out, "{\"type\":\"STATE\",\"value\":{\"n\":1}}\n");
        assert_eq!(target.table("users"), &[json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn full_batch_drains_early() {
        let mut target = MemoryTarget::new(MemoryTargetConfig { max_batch: 2 });
        let out = run(&mut target, INPUT, false).unwrap();
        assert_eq!(out, "{\"type\":\"STATE\",\"value\":{\"n\":1}}\n");
        assert_eq!(target.records_loaded(), 2);
    }

    #[test]
    fn record_before_schema_is_an_error() {
        let mut target = MemoryTarget::new(MemoryTargetConfig::default());
        let err = run(&mut target, r#"{"type":"RECORD","stream":"x","record":{}}"#, true).unwrap_err();
        assert_eq!(err.kind(), singer_api::ErrorKind::Protocol);
        assert_eq!(err.stream(), Some("x"));
        assert!(err.message().contains("before its SCHEMA"));
    }

    #[test]
    fn malformed_line_names_line_number() {
        let mut target = MemoryTarget::new(MemoryTargetConfig::default());
        let err = run(&mut target, "\n{not json\n", true).unwrap_err();
        assert_eq!(err.kind(), singer_api::ErrorKind::Protocol);
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().starts_with("line 2:"));
    }
}
