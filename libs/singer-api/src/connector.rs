use std::io::{BufRead, Write};

use crate::config::{ConnectorConfig, PluginOptions};
use crate::error::ConnectorError;
use crate::message::{Message, MessageWriter};

/// The output channels a connector writes to in place of the process
/// streams. The host decides where they go: real stdout/stderr in
/// production, in-memory buffers under test.
pub struct Channels<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

impl<'a> Channels<'a> {
    pub fn new(stdout: &'a mut dyn Write, stderr: &'a mut dyn Write) -> Self {
        Self { stdout, stderr }
    }

    /// Write one message line to stdout.
    pub fn emit(&mut self, message: &Message) -> Result<(), ConnectorError> {
        MessageWriter::new(&mut *self.stdout).write(message)
    }

    /// Write a diagnostic line to stderr.
    pub fn log(&mut self, line: impl std::fmt::Display) -> Result<(), ConnectorError> {
        writeln!(self.stderr, "{line}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ConnectorError> {
        self.stdout.flush()?;
        self.stderr.flush()?;
        Ok(())
    }
}

/// Common constructor for taps and targets.
pub trait Plugin: Sized {
    /// Connector name used in logs (`tap-foo`, `target-bar`).
    const NAME: &'static str;

    /// Create a configured instance.
    fn create(config: ConnectorConfig, options: &PluginOptions) -> Result<Self, ConnectorError>;
}

/// Extraction connector.
pub trait Tap: Plugin {
    /// Return the catalog document as JSON text.
    fn discover(&mut self) -> Result<String, ConnectorError>;

    /// Check that the source is reachable with the current config.
    fn test_connection(&mut self) -> Result<bool, ConnectorError>;

    /// Sync every selected stream, writing messages to `channels.stdout`.
    fn sync_all(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError>;
}

/// Loading connector.
pub trait Target: Plugin {
    /// Consume message lines from `input` until it is exhausted.
    fn process_lines(
        &mut self,
        input: &mut dyn BufRead,
        channels: &mut Channels<'_>,
    ) -> Result<(), ConnectorError>;

    /// Treat end of input as the completion signal: drain everything
    /// buffered and emit the final state.
    fn process_endofpipe(&mut self, channels: &mut Channels<'_>) -> Result<(), ConnectorError>;
}
