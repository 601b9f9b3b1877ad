use std::ops::Deref;

use singer_api::{ConnectorConfig, PluginOptions, Tap};

use crate::capture::capture;
use crate::error::TestingError;
use crate::output::ClassifySummary;
use crate::runner::SingerTestRunner;

/// Drives a tap: every operation creates a fresh instance from the stored
/// config, like invoking the tap executable anew.
pub struct TapTestRunner<T: Tap> {
    runner: SingerTestRunner<T>,
}

impl<T: Tap> TapTestRunner<T> {
    pub fn new(config: ConnectorConfig) -> Self {
        Self::with_options(config, PluginOptions::default())
    }

    /// `options` become the default keyword arguments for every `create`.
    pub fn with_options(config: ConnectorConfig, options: PluginOptions) -> Self {
        Self {
            runner: SingerTestRunner::new(config, options),
        }
    }

    /// A new configured tap.
    pub fn tap(&self) -> Result<T, TestingError> {
        self.runner.create(None)
    }

    /// Run discovery and return the catalog text.
    pub fn run_discovery(&self) -> Result<String, TestingError> {
        let catalog = self.tap()?.discover()?;
        tracing::info!(tap = T::NAME, bytes = catalog.len(), "discovery complete");
        Ok(catalog)
    }

    /// Run the connection test.
    pub fn run_connection_test(&self) -> Result<bool, TestingError> {
        let ok = self.tap()?.test_connection()?;
        tracing::info!(tap = T::NAME, ok, "connection test complete");
        Ok(ok)
    }

    /// Run a full sync, capturing and classifying everything the tap emits.
    pub fn sync_all(&mut self) -> Result<ClassifySummary, TestingError> {
        let mut tap = self.tap()?;
        let output = capture(|channels| tap.sync_all(channels))?;
        let summary = self.runner.absorb(output)?;
        tracing::debug!(
            tap = T::NAME,
            schema = summary.schema,
            record = summary.record,
            state = summary.state,
            "tap sync complete"
        );
        Ok(summary)
    }
}

impl<T: Tap> Deref for TapTestRunner<T> {
    type Target = SingerTestRunner<T>;

    fn deref(&self) -> &Self::Target {
        &self.runner
    }
}
