//! Failures raised by connectors while they are created or driven.

use std::fmt;

/// Which part of a connector's work failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Config or options were rejected by `create`.
    Config,
    /// An input or output channel could not be read or written.
    Io,
    /// A line is not a valid Singer message, or messages arrived out of order.
    Protocol,
    /// The connector could not produce its data.
    Sync,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Sync => "sync",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every connector trait method.
///
/// Besides the kind and message it can name the input line and the stream it
/// concerns, plus any number of context labels added by callers (connector
/// name, config path). `Display` renders them outermost first:
/// `tap-sample: line 3: stream 'users': message`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectorError {
    kind: ErrorKind,
    message: String,
    line: Option<u64>,
    stream: Option<String>,
    context: Vec<String>,
}

impl ConnectorError {
    fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            stream: None,
            context: Vec::new(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Config, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Protocol, message)
    }

    pub fn sync(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Sync, message)
    }

    /// Attach the 1-based input line the error was found on.
    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach the stream the error concerns.
    pub fn for_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Wrap in an outer context label. Kind, line and stream are kept.
    pub fn with_context(mut self, ctx: impl fmt::Display) -> Self {
        self.context.insert(0, ctx.to_string());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The bare message, without line, stream or context.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{ctx}: ")?;
        }
        if let Some(line) = self.line {
            write!(f, "line {line}: ")?;
        }
        if let Some(ref stream) = self.stream {
            write!(f, "stream '{stream}': ")?;
        }
        f.write_str(&self.message)
    }
}

impl fmt::Debug for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {self}", self.kind)
    }
}

impl std::error::Error for ConnectorError {}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        Self::with_kind(ErrorKind::Io, e.to_string())
    }
}

/// A line that fails to (de)serialize is a protocol violation.
impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::protocol(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ConnectorError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::protocol(e.to_string())
    }
}
