use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;

// ════════════════════════════════════════════════════════════════
//  Message type discriminant
// ════════════════════════════════════════════════════════════════

/// Value of the `type` field carried by every message line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Schema,
    Record,
    State,
    ActivateVersion,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Schema => "SCHEMA",
            MessageType::Record => "RECORD",
            MessageType::State => "STATE",
            MessageType::ActivateVersion => "ACTIVATE_VERSION",
        }
    }

    /// Match a raw discriminant. Case-sensitive, like the wire format.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEMA" => Some(MessageType::Schema),
            "RECORD" => Some(MessageType::Record),
            "STATE" => Some(MessageType::State),
            "ACTIVATE_VERSION" => Some(MessageType::ActivateVersion),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ════════════════════════════════════════════════════════════════
//  Messages
// ════════════════════════════════════════════════════════════════

/// Describes the shape of a stream. Precedes its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMessage {
    pub stream: String,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_properties: Option<Vec<String>>,
}

/// One row of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    pub stream: String,
    pub record: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// RFC 3339 extraction timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_extracted: Option<String>,
}

/// Opaque bookmark document. Targets echo it back once the preceding
/// records are durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateVersionMessage {
    pub stream: String,
    pub version: i64,
}

/// A single protocol message, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Schema(SchemaMessage),
    Record(RecordMessage),
    State(StateMessage),
    ActivateVersion(ActivateVersionMessage),
}

impl Message {
    pub fn schema(stream: impl Into<String>, schema: serde_json::Value, key_properties: Vec<String>) -> Self {
        Message::Schema(SchemaMessage {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties: None,
        })
    }

    pub fn record(stream: impl Into<String>, record: serde_json::Value) -> Self {
        Message::Record(RecordMessage {
            stream: stream.into(),
            record,
            version: None,
            time_extracted: None,
        })
    }

    pub fn state(value: serde_json::Value) -> Self {
        Message::State(StateMessage { value })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Schema(_) => MessageType::Schema,
            Message::Record(_) => MessageType::Record,
            Message::State(_) => MessageType::State,
            Message::ActivateVersion(_) => MessageType::ActivateVersion,
        }
    }

    /// Stream the message belongs to. `None` for STATE.
    pub fn stream(&self) -> Option<&str> {
        match self {
            Message::Schema(m) => Some(&m.stream),
            Message::Record(m) => Some(&m.stream),
            Message::ActivateVersion(m) => Some(&m.stream),
            Message::State(_) => None,
        }
    }

    /// Parse one NDJSON line.
    pub fn from_line(line: &str) -> Result<Self, ConnectorError> {
        Ok(serde_json::from_str(line.trim_end_matches('\r'))?)
    }
}

// ════════════════════════════════════════════════════════════════
//  MessageWriter
// ════════════════════════════════════════════════════════════════

/// Writes messages as newline-delimited JSON.
pub struct MessageWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write(&mut self, message: &Message) -> Result<(), ConnectorError> {
        serde_json::to_writer(&mut self.inner, message)?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ConnectorError> {
        Ok(self.inner.flush()?)
    }

    /// Number of messages written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
