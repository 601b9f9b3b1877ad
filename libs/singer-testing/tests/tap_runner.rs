use std::io::Write;

use serde_json::{json, Value};
use singer_api::{
    Channels, ConnectorConfig, ConnectorError, Message, MessageType, Plugin, PluginOptions, Tap,
};
use singer_testing::{TapTestRunner, TestingError};
use tap_sample::SampleTap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Emits one message type outside the protocol between regular messages.
struct BatchTap;

impl Plugin for BatchTap {
    const NAME: &'static str = "tap-batch";

    fn create(_config: ConnectorConfig, _options: &PluginOptions) -> Result<Self, ConnectorError> {
        Ok(Self)
    }
}

impl Tap for BatchTap {
    fn discover(&mut self) -> Result<String, ConnectorError> {
        Ok("{\"streams\":[]}".to_string())
    }

    fn test_connection(&mut self) -> Result<bool, ConnectorError> {
        Ok(true)
    }

    fn sync_all(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError> {
        channels.emit(&Message::record("users", json!({"id": 1})))?;
        writeln!(
            channels.stdout,
            r#"{{"type":"BATCH","stream":"users","manifest":["file:///tmp/users.jsonl"]}}"#
        )?;
        channels.emit(&Message::state(json!({"bookmarks": {}})))
    }
}

fn config(value: Value) -> ConnectorConfig {
    ConnectorConfig::from_value(value).unwrap()
}

#[test]
fn sync_all_buckets_messages_by_type_and_stream() {
    init_tracing();
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({
        "streams": {"orders": 25, "users": 3},
        "state_frequency": 10,
    })));

    let summary = runner.sync_all().unwrap();

    assert_eq!(summary.schema, 2);
    assert_eq!(summary.record, 28);
    // users: one interim + final; orders: interim after rows 1, 11, 21 + final
    assert_eq!(summary.state, 6);

    assert_eq!(runner.schema_messages().len(), 2);
    assert_eq!(runner.record_messages().len(), 28);
    assert_eq!(runner.state_messages().len(), 6);
    assert_eq!(runner.raw_messages().len(), 36);

    assert_eq!(runner.streams(), vec!["orders", "users"]);
    assert_eq!(runner.records("orders").len(), 25);
    let user_ids: Vec<&Value> = runner.records("users").iter().map(|r| &r["id"]).collect();
    assert_eq!(user_ids, vec![&json!(0), &json!(1), &json!(2)]);
}

#[test]
fn every_record_message_matches_its_bucket() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({"streams": {"a": 4, "b": 2}})));
    runner.sync_all().unwrap();

    for message in runner.record_messages() {
        let stream = message["stream"].as_str().unwrap();
        assert!(runner.records(stream).contains(&message["record"]));
        assert!(message.contains_key("time_extracted"));
    }
    let total: usize = runner.buckets().all_records().values().map(Vec::len).sum();
    assert_eq!(total, runner.record_messages().len());
}

#[test]
fn incremental_sync_reports_final_bookmark() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({
        "streams": {"users": 3},
        "replication_key": "updated_at",
    })));
    runner.sync_all().unwrap();

    let schema = &runner.schema_messages()[0];
    assert_eq!(schema["bookmark_properties"], json!(["updated_at"]));

    let last_state = runner.state_messages().last().unwrap();
    assert_eq!(
        last_state["value"]["bookmarks"]["users"]["replication_key_value"],
        "2024-01-01T00:02:00Z"
    );
}

#[test]
fn buckets_accumulate_but_raw_messages_reflect_last_sync() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({"streams": {"users": 2}})));
    runner.sync_all().unwrap();
    runner.sync_all().unwrap();

    assert_eq!(runner.records("users").len(), 4);
    assert_eq!(runner.schema_messages().len(), 2);
    // SCHEMA, RECORD, STATE, RECORD, STATE
    assert_eq!(runner.raw_messages().len(), 5);
}

#[test]
fn typed_messages_follow_emission_order() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({"streams": {"users": 1}})));
    runner.sync_all().unwrap();

    let kinds: Vec<MessageType> = runner
        .typed_messages()
        .unwrap()
        .iter()
        .map(|m| m.message_type())
        .collect();
    assert_eq!(kinds, vec![MessageType::Schema, MessageType::Record, MessageType::State]);
}

#[test]
fn stderr_is_captured_separately() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({"streams": {"users": 1}})));
    runner.sync_all().unwrap();

    let output = runner.last_output();
    assert!(output.stderr.contains("Beginning FULL_TABLE sync of stream 'users'..."));
    assert!(!output.stdout.contains("Beginning"));
}

#[test]
fn discovery_returns_catalog() {
    let runner = TapTestRunner::<SampleTap>::new(config(json!({
        "streams": {"users": 1, "orders": 1},
        "replication_key": "id",
    })));
    let catalog: Value = serde_json::from_str(&runner.run_discovery().unwrap()).unwrap();

    let streams = catalog["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0]["tap_stream_id"], "orders");
    assert_eq!(streams[0]["replication_method"], "INCREMENTAL");
}

#[test]
fn connection_test_uses_default_options() {
    let ok = TapTestRunner::<SampleTap>::new(config(json!({"streams": {}})));
    assert!(ok.run_connection_test().unwrap());

    let failing = TapTestRunner::<SampleTap>::with_options(
        config(json!({"streams": {}})),
        PluginOptions::new().with("fail_connection", true),
    );
    assert!(!failing.run_connection_test().unwrap());
}

#[test]
fn create_prefers_explicit_options() {
    let runner = TapTestRunner::<SampleTap>::with_options(
        config(json!({"streams": {}})),
        PluginOptions::new().with("fail_connection", true),
    );
    let mut tap = runner
        .create(Some(&PluginOptions::new().with("fail_connection", false)))
        .unwrap();
    assert!(singer_api::Tap::test_connection(&mut tap).unwrap());

    // empty options fall back to the defaults
    let mut tap = runner.create(Some(&PluginOptions::new())).unwrap();
    assert!(!singer_api::Tap::test_connection(&mut tap).unwrap());
}

#[test]
fn invalid_config_surfaces_connector_error() {
    let mut runner = TapTestRunner::<SampleTap>::new(config(json!({"state_frequency": 0})));
    match runner.sync_all().unwrap_err() {
        TestingError::Connector(e) => {
            assert_eq!(e.kind(), singer_api::ErrorKind::Config);
            assert_eq!(e.context(), &["tap-sample".to_string()]);
            assert!(e.to_string().starts_with("tap-sample: "));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.raw_messages().is_empty());
}

#[test]
fn unknown_types_are_kept_in_raw_messages_only() {
    let mut runner = TapTestRunner::<BatchTap>::new(ConnectorConfig::new());
    let summary = runner.sync_all().unwrap();

    assert_eq!(summary.unknown, 1);
    assert_eq!(runner.raw_messages().len(), 3);
    assert_eq!(runner.raw_messages()[1]["type"], "BATCH");

    let bucketed = runner
        .schema_messages()
        .iter()
        .chain(runner.record_messages())
        .chain(runner.state_messages());
    for message in bucketed {
        assert_ne!(message["type"], "BATCH");
    }
    assert_eq!(runner.record_messages().len(), 1);
    assert_eq!(runner.state_messages().len(), 1);
    assert_eq!(runner.records("users"), &[json!({"id": 1})]);
}
