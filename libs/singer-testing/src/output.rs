//! Parsing and classification of captured connector output.
//!
//! Output is newline-delimited JSON. Every line must be a JSON object; the
//! `type` field decides which bucket the message lands in, and RECORD
//! payloads are additionally grouped by their `stream`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use singer_api::{Message, MessageType};

use crate::error::TestingError;

/// One parsed output line.
pub type RawMessage = Map<String, Value>;

/// Split captured text into lines and parse each one as a JSON object.
///
/// Blank lines (including a lone `\r`) are skipped, so an empty capture
/// yields no messages. Line numbers in errors are physical lines of `raw`,
/// blank ones included.
pub fn clean_sync_output(raw: &str) -> Result<Vec<RawMessage>, TestingError> {
    let mut messages = Vec::new();
    for (idx, line) in raw.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|source| TestingError::Parse { line: line_no, source })?;
        match value {
            Value::Object(map) => messages.push(map),
            other => {
                return Err(TestingError::NotAnObject {
                    line: line_no,
                    kind: json_kind(&other),
                });
            }
        }
    }
    Ok(messages)
}

/// Deserialize raw messages into the typed [`Message`] model.
pub fn typed_messages(messages: &[RawMessage]) -> Result<Vec<Message>, TestingError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value(Value::Object(raw.clone()))
                .map_err(|source| TestingError::Decode { index, source })
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════
//  MessageBuckets
// ════════════════════════════════════════════════════════════════

/// Per-type counts from one [`MessageBuckets::classify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub schema: usize,
    pub record: usize,
    pub state: usize,
    pub activate_version: usize,
    /// Messages whose `type` is not part of the protocol.
    pub unknown: usize,
    /// Empty objects, ignored.
    pub empty: usize,
}

impl ClassifySummary {
    pub fn total(&self) -> usize {
        self.schema + self.record + self.state + self.activate_version + self.unknown + self.empty
    }

    fn add(&mut self, other: &ClassifySummary) {
        self.schema += other.schema;
        self.record += other.record;
        self.state += other.state;
        self.activate_version += other.activate_version;
        self.unknown += other.unknown;
        self.empty += other.empty;
    }
}

/// Classified messages. Append-only.
#[derive(Debug, Clone, Default)]
pub struct MessageBuckets {
    schema_messages: Vec<RawMessage>,
    record_messages: Vec<RawMessage>,
    state_messages: Vec<RawMessage>,
    records: BTreeMap<String, Vec<Value>>,
    totals: ClassifySummary,
}

impl MessageBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `messages` and append them to the buckets.
    ///
    /// The batch is validated as a whole first: on error nothing is appended.
    pub fn classify(&mut self, messages: &[RawMessage]) -> Result<ClassifySummary, TestingError> {
        let mut staged = MessageBuckets::new();

        for (index, message) in messages.iter().enumerate() {
            if message.is_empty() {
                staged.totals.empty += 1;
                continue;
            }
            let type_name = string_field(message, index, "type")?;

            match MessageType::parse(type_name) {
                Some(MessageType::State) => {
                    staged.state_messages.push(message.clone());
                    staged.totals.state += 1;
                }
                Some(MessageType::Schema) => {
                    staged.schema_messages.push(message.clone());
                    staged.totals.schema += 1;
                }
                Some(MessageType::Record) => {
                    let stream = string_field(message, index, "stream")?;
                    let record = message.get("record").cloned().unwrap_or(Value::Null);
                    staged.records.entry(stream.to_string()).or_default().push(record);
                    staged.record_messages.push(message.clone());
                    staged.totals.record += 1;
                }
                Some(MessageType::ActivateVersion) => staged.totals.activate_version += 1,
                None => {
                    tracing::warn!(index, message_type = type_name, "unknown message type");
                    staged.totals.unknown += 1;
                }
            }
        }

        let summary = staged.totals;
        self.append(staged);
        Ok(summary)
    }

    fn append(&mut self, other: MessageBuckets) {
        self.schema_messages.extend(other.schema_messages);
        self.record_messages.extend(other.record_messages);
        self.state_messages.extend(other.state_messages);
        for (stream, rows) in other.records {
            self.records.entry(stream).or_default().extend(rows);
        }
        self.totals.add(&other.totals);
    }

    pub fn schema_messages(&self) -> &[RawMessage] {
        &self.schema_messages
    }

    pub fn record_messages(&self) -> &[RawMessage] {
        &self.record_messages
    }

    pub fn state_messages(&self) -> &[RawMessage] {
        &self.state_messages
    }

    /// Record payloads of `stream`, in emission order. Empty if the stream
    /// produced no records.
    pub fn records(&self, stream: &str) -> &[Value] {
        self.records.get(stream).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_records(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.records
    }

    /// Names of streams that produced at least one record, sorted.
    pub fn streams(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    /// Counts accumulated over every `classify` call.
    pub fn totals(&self) -> ClassifySummary {
        self.totals
    }
}

fn string_field<'a>(
    message: &'a RawMessage,
    index: usize,
    field: &'static str,
) -> Result<&'a str, TestingError> {
    match message.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(TestingError::NotAString { index, field, found: json_kind(other) }),
        None => Err(TestingError::MissingField { index, field }),
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
