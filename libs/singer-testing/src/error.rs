use singer_api::ConnectorError;

#[derive(Debug, thiserror::Error)]
pub enum TestingError {
    #[error("line {line}: invalid JSON: {source}")]
    Parse { line: usize, source: serde_json::Error },

    #[error("line {line}: expected a JSON object, got {kind}")]
    NotAnObject { line: usize, kind: &'static str },

    #[error("message {index}: missing field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("message {index}: field '{field}' must be a string, got {found}")]
    NotAString { index: usize, field: &'static str, found: &'static str },

    #[error("message {index}: {source}")]
    Decode { index: usize, source: serde_json::Error },

    #[error("connector: {0}")]
    Connector(#[from] ConnectorError),

    #[error("input ({path}): {source}")]
    Input { path: String, source: std::io::Error },

    #[error("captured {channel} is not valid UTF-8: {source}")]
    Utf8 { channel: &'static str, source: std::string::FromUtf8Error },
}
