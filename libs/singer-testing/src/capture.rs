use singer_api::{Channels, ConnectorError};

use crate::error::TestingError;

/// Text a connector wrote during one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `f` with both channels redirected into in-memory buffers.
///
/// The buffers live only for the duration of the call. A connector error is
/// returned as-is; whatever reached stderr before it is logged.
pub fn capture<F>(f: F) -> Result<CapturedOutput, TestingError>
where
    F: FnOnce(&mut Channels<'_>) -> Result<(), ConnectorError>,
{
    let mut stdout_buf: Vec<u8> = Vec::new();
    let mut stderr_buf: Vec<u8> = Vec::new();

    let result = {
        let mut channels = Channels::new(&mut stdout_buf, &mut stderr_buf);
        f(&mut channels).and_then(|()| channels.flush())
    };

    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            stderr = %String::from_utf8_lossy(&stderr_buf),
            "connector failed during captured sync"
        );
        return Err(e.into());
    }

    Ok(CapturedOutput {
        stdout: String::from_utf8(stdout_buf)
            .map_err(|source| TestingError::Utf8 { channel: "stdout", source })?,
        stderr: String::from_utf8(stderr_buf)
            .map_err(|source| TestingError::Utf8 { channel: "stderr", source })?,
    })
}
