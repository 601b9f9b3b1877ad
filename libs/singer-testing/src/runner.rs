use std::marker::PhantomData;

use serde_json::Value;
use singer_api::{ConnectorConfig, Message, Plugin, PluginOptions};

use crate::capture::CapturedOutput;
use crate::error::TestingError;
use crate::output::{clean_sync_output, typed_messages, ClassifySummary, MessageBuckets, RawMessage};

/// State shared by the tap and target runners: how to build the connector,
/// and everything its syncs produced.
pub struct SingerTestRunner<P: Plugin> {
    config: ConnectorConfig,
    default_options: PluginOptions,
    raw_messages: Vec<RawMessage>,
    buckets: MessageBuckets,
    last_output: CapturedOutput,
    _plugin: PhantomData<fn() -> P>,
}

impl<P: Plugin> SingerTestRunner<P> {
    pub fn new(config: ConnectorConfig, default_options: PluginOptions) -> Self {
        Self {
            config,
            default_options,
            raw_messages: Vec::new(),
            buckets: MessageBuckets::new(),
            last_output: CapturedOutput::default(),
            _plugin: PhantomData,
        }
    }

    /// Instantiate the connector with the stored config.
    ///
    /// `None` or empty `options` fall back to the runner's default options.
    pub fn create(&self, options: Option<&PluginOptions>) -> Result<P, TestingError> {
        let options = match options {
            Some(o) if !o.is_empty() => o,
            _ => &self.default_options,
        };
        let plugin = P::create(self.config.clone(), options)
            .map_err(|e| e.with_context(P::NAME))?;
        tracing::debug!(plugin = P::NAME, "created connector");
        Ok(plugin)
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn default_options(&self) -> &PluginOptions {
        &self.default_options
    }

    /// Messages parsed from the most recent sync.
    pub fn raw_messages(&self) -> &[RawMessage] {
        &self.raw_messages
    }

    /// Typed view of [`Self::raw_messages`].
    pub fn typed_messages(&self) -> Result<Vec<Message>, TestingError> {
        typed_messages(&self.raw_messages)
    }

    pub fn buckets(&self) -> &MessageBuckets {
        &self.buckets
    }

    pub fn schema_messages(&self) -> &[RawMessage] {
        self.buckets.schema_messages()
    }

    pub fn record_messages(&self) -> &[RawMessage] {
        self.buckets.record_messages()
    }

    pub fn state_messages(&self) -> &[RawMessage] {
        self.buckets.state_messages()
    }

    pub fn records(&self, stream: &str) -> &[Value] {
        self.buckets.records(stream)
    }

    pub fn streams(&self) -> Vec<&str> {
        self.buckets.streams()
    }

    /// Captured stdout/stderr of the most recent sync.
    pub fn last_output(&self) -> &CapturedOutput {
        &self.last_output
    }

    /// Store captured output, then parse it and fold it into the runner.
    ///
    /// The output is kept even when it fails to parse. `raw_messages` is
    /// replaced and the buckets are appended to only if parsing succeeds.
    pub(crate) fn absorb(&mut self, output: CapturedOutput) -> Result<ClassifySummary, TestingError> {
        self.last_output = output;
        let messages = clean_sync_output(&self.last_output.stdout)?;
        let summary = self.buckets.classify(&messages)?;
        self.raw_messages = messages;
        Ok(summary)
    }
}
