//! Thin handle traits over the STT/LLM/TTS engines.
//!
//! The [`Turn`] control flow talks only to these three traits, never to
//! `voicegate-stt`/`voicegate-tts`/`voicegate-llm` concrete types
//! directly. That seam is what spec.md §9's first design note asks
//! for: tests inject [`crate::fakes`] implementations instead of real
//! provider sessions, so control-flow bugs (ordering, interruption,
//! teardown) can be exercised without a network.

use async_trait::async_trait;
use voicegate_llm::GenerationResult;

use crate::error::OrchestratorError;

#[async_trait]
pub trait SttHandle: Send {
    async fn connect(&mut self) -> Result<(), OrchestratorError>;
    async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), OrchestratorError>;
    /// Signal end-of-speech and return the assembled final transcript.
    async fn finish(&mut self) -> Result<String, OrchestratorError>;
}

#[async_trait]
pub trait TtsHandle: Send {
    async fn start(&mut self, text: &str) -> Result<(), OrchestratorError>;
    /// Returns `Ok(None)` once the utterance is fully streamed.
    async fn next_chunk(&mut self) -> Result<Option<TtsChunkOut>, OrchestratorError>;
    /// Interrupt playback, e.g. on barge-in.
    fn cancel(&mut self);
    /// Fold a finished (`Completed`/`Cancelled`/`Error`) session back to
    /// idle so it's ready for the next utterance on this connection.
    fn reset(&mut self);
    /// Ping the provider connection to keep it from idling out between
    /// utterances.
    async fn keepalive(&mut self) -> Result<(), OrchestratorError>;
}

#[derive(Debug, Clone)]
pub struct TtsChunkOut {
    pub audio: Vec<u8>,
    pub is_final: bool,
    pub sample_rate: u32,
}

#[async_trait]
pub trait LlmHandle: Send {
    async fn respond(&mut self, text: &str) -> GenerationResult;
}

/// Adapters wrapping the real engine types in the handle traits above.
pub mod real {
    use std::sync::Arc;

    use async_trait::async_trait;
    use voicegate_core::SessionId;
    use voicegate_llm::{GenerationResult, LlmEngine};
    use voicegate_stt::{SttEvent, SttSession};
    use voicegate_tts::{TtsChunk, TtsSession};

    use super::{OrchestratorError, SttHandle, TtsChunkOut, TtsHandle};
    use crate::LlmHandle;

    pub struct RealSttHandle {
        session: SttSession,
    }

    impl RealSttHandle {
        pub fn new(session: SttSession) -> Self {
            Self { session }
        }
    }

    #[async_trait]
    impl SttHandle for RealSttHandle {
        async fn connect(&mut self) -> Result<(), OrchestratorError> {
            self.session
                .connect()
                .await
                .map_err(|e| OrchestratorError::Stt(e.to_string()))
        }

        async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), OrchestratorError> {
            self.session
                .send_audio(pcm16le)
                .await
                .map_err(|e| OrchestratorError::Stt(e.to_string()))
        }

        async fn finish(&mut self) -> Result<String, OrchestratorError> {
            self.session
                .finish()
                .await
                .map_err(|e| OrchestratorError::Stt(e.to_string()))?;
            while let Some(event) = self.session.next_event().await {
                match event {
                    Ok(SttEvent::Final(_)) => break,
                    Ok(SttEvent::Partial(_)) => continue,
                    Err(e) => return Err(OrchestratorError::Stt(e.to_string())),
                }
            }
            Ok(self.session.transcript().to_string())
        }
    }

    pub struct RealTtsHandle {
        session: TtsSession,
        sample_rate: u32,
    }

    impl RealTtsHandle {
        pub fn new(session: TtsSession, sample_rate: u32) -> Self {
            Self {
                session,
                sample_rate,
            }
        }
    }

    #[async_trait]
    impl TtsHandle for RealTtsHandle {
        async fn start(&mut self, text: &str) -> Result<(), OrchestratorError> {
            self.session
                .start(text)
                .await
                .map_err(|e| OrchestratorError::Tts(e.to_string()))
        }

        async fn next_chunk(&mut self) -> Result<Option<TtsChunkOut>, OrchestratorError> {
            let chunk: Option<TtsChunk> = self
                .session
                .next_chunk()
                .await
                .map_err(|e| OrchestratorError::Tts(e.to_string()))?;
            Ok(chunk.map(|c| TtsChunkOut {
                audio: c.audio,
                is_final: c.is_final,
                sample_rate: self.sample_rate,
            }))
        }

        fn cancel(&mut self) {
            self.session.cancel();
        }

        fn reset(&mut self) {
            self.session.reset();
        }

        async fn keepalive(&mut self) -> Result<(), OrchestratorError> {
            self.session
                .keepalive()
                .await
                .map_err(|e| OrchestratorError::Tts(e.to_string()))
        }
    }

    pub struct RealLlmHandle {
        engine: Arc<LlmEngine>,
        session_id: SessionId,
    }

    impl RealLlmHandle {
        pub fn new(engine: Arc<LlmEngine>, session_id: SessionId) -> Self {
            Self { engine, session_id }
        }
    }

    #[async_trait]
    impl LlmHandle for RealLlmHandle {
        async fn respond(&mut self, text: &str) -> GenerationResult {
            self.engine.respond(self.session_id, text).await
        }
    }
}
