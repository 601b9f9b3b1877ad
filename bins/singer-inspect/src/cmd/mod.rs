use std::io::Read;
use std::path::Path;

use singer_testing::{clean_sync_output, ClassifySummary, MessageBuckets};

use crate::error::InspectError;

pub mod records;
pub mod summary;

/// Read a capture file (`-` = stdin), parse and classify it.
pub(crate) fn load(path: &Path) -> Result<(MessageBuckets, ClassifySummary), InspectError> {
    let text = read_capture(path)?;
    let messages = clean_sync_output(&text)?;
    let mut buckets = MessageBuckets::new();
    let summary = buckets.classify(&messages)?;
    tracing::debug!(path = %path.display(), messages = messages.len(), "classified capture");
    Ok((buckets, summary))
}

fn read_capture(path: &Path) -> Result<String, InspectError> {
    let read_err = |source| InspectError::Read { path: path.display().to_string(), source };
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(read_err)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).map_err(read_err)
    }
}
