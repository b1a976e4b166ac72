//! The canonical wire-facing error taxonomy from spec.md §6.
//!
//! Every crate defines its own `thiserror` error enum for its internal
//! failure modes; `ErrorCode` is the small, fixed vocabulary those errors
//! get mapped down to before they cross the wire in an `*.error` frame.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    InvalidPayload,
    SessionError,
    ConnectionError,
    AudioError,
    SttError,
    LlmError,
    TtsError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalidPayload",
            Self::SessionError => "sessionError",
            Self::ConnectionError => "connectionError",
            Self::AudioError => "audioError",
            Self::SttError => "sttError",
            Self::LlmError => "llmError",
            Self::TtsError => "ttsError",
            Self::InternalError => "internalError",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
