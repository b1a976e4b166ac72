use thiserror::Error;

/// How a failure should be handled by the session's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttFailureKind {
    /// Connection refused, credential rejected, provider returned a
    /// terminal status — retrying will not help, surface `sttError`
    /// to the client and tear the session down.
    Fatal,
    /// Transient network blip — worth retrying per the connect or
    /// mid-stream reconnect schedule.
    Retryable,
    /// No provider response within the configured window.
    Timeout,
}

#[derive(Debug, Error)]
pub enum SttError {
    #[error("failed to connect to STT provider: {0}")]
    ConnectFailed(String),

    #[error("STT provider rejected the session: {0}")]
    Rejected(String),

    #[error("STT provider connection lost: {0}")]
    ConnectionLost(String),

    #[error("no response from STT provider within the configured window")]
    Timeout,

    #[error("STT provider returned a malformed result: {0}")]
    MalformedResult(String),

    #[error("audio send failed: {0}")]
    SendFailed(String),
}

impl SttError {
    pub fn kind(&self) -> SttFailureKind {
        match self {
            Self::Rejected(_) => SttFailureKind::Fatal,
            Self::Timeout => SttFailureKind::Timeout,
            Self::ConnectFailed(_) | Self::ConnectionLost(_) | Self::SendFailed(_) => {
                SttFailureKind::Retryable
            }
            Self::MalformedResult(_) => SttFailureKind::Fatal,
        }
    }
}
