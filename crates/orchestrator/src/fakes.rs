//! Fake handle implementations for exercising [`crate::Turn`]'s control
//! flow without a real STT/TTS/LLM engine behind it.

use async_trait::async_trait;
use voicegate_llm::GenerationResult;

use crate::error::OrchestratorError;
use crate::handles::{LlmHandle, SttHandle, TtsChunkOut, TtsHandle};

/// Reports back the number of bytes it was fed as the "transcript",
/// same convention as `voicegate-stt`'s echo provider.
pub struct FakeSttHandle {
    pub connect_result: Result<(), String>,
    bytes_received: usize,
    /// When true, `finish` reports no speech detected regardless of
    /// bytes received, mimicking a provider that recognized only
    /// silence/noise.
    silent: bool,
}

impl FakeSttHandle {
    pub fn new() -> Self {
        Self {
            connect_result: Ok(()),
            bytes_received: 0,
            silent: false,
        }
    }

    pub fn failing_connect(message: impl Into<String>) -> Self {
        Self {
            connect_result: Err(message.into()),
            bytes_received: 0,
            silent: false,
        }
    }

    /// Always reports an empty transcript, as if the provider heard
    /// only silence.
    pub fn silent() -> Self {
        Self {
            connect_result: Ok(()),
            bytes_received: 0,
            silent: true,
        }
    }
}

#[async_trait]
impl SttHandle for FakeSttHandle {
    async fn connect(&mut self) -> Result<(), OrchestratorError> {
        self.connect_result
            .clone()
            .map_err(OrchestratorError::Stt)
    }

    async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), OrchestratorError> {
        self.bytes_received += pcm16le.len();
        Ok(())
    }

    async fn finish(&mut self) -> Result<String, OrchestratorError> {
        if self.silent {
            return Ok(String::new());
        }
        Ok(format!("heard {} bytes", self.bytes_received))
    }
}

/// Replays the text it was given as chunks of its UTF-8 bytes, exactly
/// like `voicegate-tts`'s echo provider, so `Turn` tests see the same
/// chunk/complete shape a real session would produce.
pub struct FakeTtsHandle {
    remaining: Vec<u8>,
    cancelled: bool,
}

impl FakeTtsHandle {
    pub fn new() -> Self {
        Self {
            remaining: Vec::new(),
            cancelled: false,
        }
    }
}

#[async_trait]
impl TtsHandle for FakeTtsHandle {
    async fn start(&mut self, text: &str) -> Result<(), OrchestratorError> {
        self.remaining = text.as_bytes().to_vec();
        self.cancelled = false;
        Ok(())
    }

    async fn next_chunk(&mut self) -> Result<Option<TtsChunkOut>, OrchestratorError> {
        if self.cancelled {
            return Ok(None);
        }
        if self.remaining.is_empty() {
            return Ok(None);
        }
        let take = 8.min(self.remaining.len());
        let audio: Vec<u8> = self.remaining.drain(..take).collect();
        let is_final = self.remaining.is_empty();
        Ok(Some(TtsChunkOut {
            audio,
            is_final,
            sample_rate: 16_000,
        }))
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.remaining.clear();
    }

    fn reset(&mut self) {
        self.cancelled = false;
        self.remaining.clear();
    }

    async fn keepalive(&mut self) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Always replies with a fixed string, flagged as a real (non-fallback)
/// response.
pub struct FakeLlmHandle {
    pub reply: String,
}

impl FakeLlmHandle {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl LlmHandle for FakeLlmHandle {
    async fn respond(&mut self, _text: &str) -> GenerationResult {
        GenerationResult::real(self.reply.clone())
    }
}
