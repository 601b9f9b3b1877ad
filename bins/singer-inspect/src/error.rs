#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("read ({path}): {source}")]
    Read { path: String, source: std::io::Error },

    #[error("{0}")]
    Testing(#[from] singer_testing::TestingError),

    #[error("{0} message(s) with an unknown type")]
    UnknownTypes(usize),

    #[error("stream '{0}' has no records")]
    NoRecords(String),

    #[error("write: {0}")]
    Write(#[from] std::io::Error),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}
