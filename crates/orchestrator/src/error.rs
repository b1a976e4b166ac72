use thiserror::Error;
use voicegate_core::ErrorCode;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("STT engine error: {0}")]
    Stt(String),

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("audio processing error: {0}")]
    Audio(String),

    #[error("session error: {0}")]
    Session(String),
}

impl OrchestratorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Stt(_) => ErrorCode::SttError,
            Self::Tts(_) => ErrorCode::TtsError,
            Self::Audio(_) => ErrorCode::AudioError,
            Self::Session(_) => ErrorCode::SessionError,
        }
    }
}
