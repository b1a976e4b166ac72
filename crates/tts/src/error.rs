use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsFailureKind {
    Fatal,
    Retryable,
}

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("failed to connect to TTS provider: {0}")]
    ConnectFailed(String),

    #[error("TTS provider rejected the request: {0}")]
    Rejected(String),

    #[error("TTS provider connection lost: {0}")]
    ConnectionLost(String),

    #[error("reconnection buffer overflowed ({0} bytes buffered)")]
    BufferOverflow(usize),

    #[error("audio send failed: {0}")]
    SendFailed(String),
}

impl TtsError {
    pub fn kind(&self) -> TtsFailureKind {
        match self {
            Self::Rejected(_) | Self::BufferOverflow(_) => TtsFailureKind::Fatal,
            Self::ConnectFailed(_) | Self::ConnectionLost(_) | Self::SendFailed(_) => {
                TtsFailureKind::Retryable
            }
        }
    }
}
