use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use singer_api::{ConnectorConfig, PluginOptions, Target};

use crate::capture::capture;
use crate::error::TestingError;
use crate::output::ClassifySummary;
use crate::runner::SingerTestRunner;

/// Where the target's input lines come from.
enum InputSource {
    None,
    /// Opened on first sync.
    File(PathBuf),
    Reader(Box<dyn BufRead>),
    /// Already fed to a sync.
    Consumed,
}

/// Drives a target: feeds it message lines as if from stdin and captures
/// the state messages it writes back.
pub struct TargetTestRunner<T: Target> {
    runner: SingerTestRunner<T>,
    input: InputSource,
}

impl<T: Target> TargetTestRunner<T> {
    pub fn new(config: ConnectorConfig) -> Self {
        Self::with_options(config, PluginOptions::default())
    }

    pub fn with_options(config: ConnectorConfig, options: PluginOptions) -> Self {
        Self {
            runner: SingerTestRunner::new(config, options),
            input: InputSource::None,
        }
    }

    /// Read input from a file of message lines. Ignored if an in-memory input
    /// was already given.
    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        if !matches!(self.input, InputSource::Reader(_)) {
            self.input = InputSource::File(path.into());
        }
        self
    }

    /// Read input from an in-memory buffer of message lines.
    pub fn with_input(mut self, text: impl Into<String>) -> Self {
        self.input = InputSource::Reader(Box::new(Cursor::new(text.into())));
        self
    }

    /// Replace the input for the next sync.
    pub fn set_input(&mut self, reader: impl BufRead + 'static) {
        self.input = InputSource::Reader(Box::new(reader));
    }

    /// A new configured target.
    pub fn target(&self) -> Result<T, TestingError> {
        self.runner.create(None)
    }

    /// `sync(true)`: process all input, then signal end of stream.
    pub fn sync_all(&mut self) -> Result<ClassifySummary, TestingError> {
        self.sync(true)
    }

    /// Feed the pending input to a new target.
    ///
    /// With `finalize` the end of input is treated as the completion signal;
    /// without it the target is left as if more input could follow.
    pub fn sync(&mut self, finalize: bool) -> Result<ClassifySummary, TestingError> {
        let mut target = self.target()?;
        let mut input = self.take_input()?;

        let output = capture(|channels| {
            if let Some(reader) = input.as_mut() {
                target.process_lines(reader.as_mut(), channels)?;
            }
            if finalize {
                target.process_endofpipe(channels)?;
            }
            Ok(())
        })?;

        let summary = self.runner.absorb(output)?;
        tracing::debug!(
            connector = T::NAME,
            finalize,
            state = summary.state,
            "target sync complete"
        );
        Ok(summary)
    }

    /// Captured stdout of the most recent sync.
    pub fn stdout(&self) -> &str {
        &self.runner.last_output().stdout
    }

    /// Captured stderr of the most recent sync.
    pub fn stderr(&self) -> &str {
        &self.runner.last_output().stderr
    }

    fn take_input(&mut self) -> Result<Option<Box<dyn BufRead>>, TestingError> {
        match std::mem::replace(&mut self.input, InputSource::Consumed) {
            InputSource::Reader(reader) => Ok(Some(reader)),
            InputSource::File(path) => match open_input(&path) {
                Ok(reader) => Ok(Some(Box::new(reader))),
                Err(e) => {
                    self.input = InputSource::File(path);
                    Err(e)
                }
            },
            InputSource::None => {
                self.input = InputSource::None;
                Ok(None)
            }
            InputSource::Consumed => Ok(None),
        }
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>, TestingError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TestingError::Input {
            path: path.display().to_string(),
            source,
        })
}

impl<T: Target> Deref for TargetTestRunner<T> {
    type Target = SingerTestRunner<T>;

    fn deref(&self) -> &Self::Target {
        &self.runner
    }
}
