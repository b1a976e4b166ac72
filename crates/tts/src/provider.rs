use std::borrow::Cow;

use async_trait::async_trait;

use crate::error::TtsError;

/// The hard cap on synthesizable input text length. Text beyond this is
/// truncated to the cap and synthesis proceeds on the truncated text
/// rather than failing the whole utterance.
pub const MAX_TEXT_CHARS: usize = 5_000;

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub voice_id: Option<String>,
    pub sample_rate_hz: u32,
}

/// A chunk of synthesized PCM16LE audio for one utterance.
#[derive(Debug, Clone)]
pub struct TtsChunk {
    pub audio: Vec<u8>,
    pub is_final: bool,
}

/// Rejects empty/whitespace-only text, otherwise truncates to
/// [`MAX_TEXT_CHARS`] if needed. Returns the (possibly truncated) text
/// to submit for synthesis.
pub fn prepare_text(text: &str) -> Result<Cow<'_, str>, TtsError> {
    if text.trim().is_empty() {
        return Err(TtsError::Rejected("text is empty".to_string()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        Ok(Cow::Owned(text.chars().take(MAX_TEXT_CHARS).collect()))
    } else {
        Ok(Cow::Borrowed(text))
    }
}


#[async_trait]
pub trait TtsProvider: Send + Sync {
    async fn connect(&self, config: TtsConfig) -> Result<Box<dyn TtsStream>, TtsError>;
}

/// A single open synthesis session. `synthesize` submits the full
/// utterance text up front (the providers this is modeled on do not
/// support incremental text input); `recv` streams audio chunks back
/// until the final chunk, after which the stream is spent.
#[async_trait]
pub trait TtsStream: Send {
    async fn synthesize(&mut self, text: &str) -> Result<(), TtsError>;
    async fn recv(&mut self) -> Option<Result<TtsChunk, TtsError>>;
    /// A lightweight no-op frame to keep the provider connection from
    /// idling out while waiting between utterances.
    async fn keepalive(&mut self) -> Result<(), TtsError>;
}
