use std::sync::Arc;

use tracing::{info, warn};

use crate::buffer::{ReconnectBuffer, RECONNECT_BACKOFF_MS};
use crate::error::TtsError;
use crate::provider::{prepare_text, TtsChunk, TtsConfig, TtsProvider, TtsStream};
use crate::state::TtsState;

/// Drives a single utterance's TTS session through its state machine,
/// holding synthesized audio in a [`ReconnectBuffer`] if the provider
/// connection drops mid-stream so playback can resume once reconnected
/// instead of losing already-generated audio.
pub struct TtsSession {
    provider: Arc<dyn TtsProvider>,
    config: TtsConfig,
    stream: Option<Box<dyn TtsStream>>,
    state: TtsState,
    buffer: ReconnectBuffer,
}

impl TtsSession {
    pub fn new(provider: Arc<dyn TtsProvider>, config: TtsConfig) -> Self {
        Self {
            provider,
            config,
            stream: None,
            state: TtsState::Idle,
            buffer: ReconnectBuffer::default(),
        }
    }

    pub fn state(&self) -> TtsState {
        self.state
    }

    fn transition(&mut self, to: TtsState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal TTS transition {:?} -> {:?}",
            self.state,
            to
        );
        self.state = to;
    }

    /// Connect (if not already) and submit `text` for synthesis.
    ///
    /// The session is reused across every utterance on a connection, so a
    /// prior utterance may have left it in `Completed`/`Cancelled`/`Error`;
    /// `reset()` folds that back to `Idle` before we transition forward.
    pub async fn start(&mut self, text: &str) -> Result<(), TtsError> {
        let text = prepare_text(text)?;
        self.reset();
        self.transition(TtsState::Generating);
        if self.stream.is_none() {
            let stream = self.provider.connect(self.config.clone()).await?;
            self.stream = Some(stream);
        }
        let stream = self.stream.as_mut().expect("just connected");
        match stream.synthesize(&text).await {
            Ok(()) => {
                self.transition(TtsState::Streaming);
                Ok(())
            }
            Err(e) => {
                self.transition(TtsState::Error);
                Err(e)
            }
        }
    }

    /// Pull the next chunk, reconnecting through [`RECONNECT_BACKOFF_MS`]
    /// on a transient drop before giving up. Already-received chunks
    /// that the caller hasn't drained yet live in the reconnect buffer.
    pub async fn next_chunk(&mut self) -> Result<Option<TtsChunk>, TtsError> {
        if self.state != TtsState::Streaming {
            return Ok(None);
        }

        if let Some(buffered) = self.buffer.pop() {
            return Ok(Some(TtsChunk {
                audio: buffered,
                is_final: false,
            }));
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TtsError::ConnectionLost("not connected".to_string()))?;

        match stream.recv().await {
            Some(Ok(chunk)) => {
                if chunk.is_final {
                    self.transition(TtsState::Completed);
                }
                Ok(Some(chunk))
            }
            Some(Err(e)) if e.kind() == crate::error::TtsFailureKind::Retryable => {
                warn!(error = %e, "TTS stream dropped mid-utterance, reconnecting");
                self.reconnect().await?;
                Ok(Some(TtsChunk {
                    audio: Vec::new(),
                    is_final: false,
                }))
            }
            Some(Err(e)) => {
                self.transition(TtsState::Error);
                Err(e)
            }
            None => {
                self.transition(TtsState::Error);
                Err(TtsError::ConnectionLost("provider closed stream".to_string()))
            }
        }
    }

    async fn reconnect(&mut self) -> Result<(), TtsError> {
        let mut last_err = None;
        for (attempt, ms) in RECONNECT_BACKOFF_MS.iter().enumerate() {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
            }
            match self.provider.connect(self.config.clone()).await {
                Ok(stream) => {
                    self.stream = Some(stream);
                    info!(attempt, "TTS reconnected mid-utterance");
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }
        self.transition(TtsState::Error);
        Err(last_err.unwrap_or(TtsError::ConnectFailed("no attempts made".to_string())))
    }

    /// Buffer a chunk that arrived while the caller wasn't ready to
    /// consume it yet (e.g. waiting on the channel write side).
    pub fn buffer_chunk(&mut self, audio: Vec<u8>) -> Result<(), TtsError> {
        self.buffer.push(audio)
    }

    /// Interrupt playback, e.g. because the client started speaking
    /// again. Only legal while actively streaming.
    pub fn cancel(&mut self) {
        if self.state == TtsState::Streaming {
            self.transition(TtsState::Cancelled);
        }
    }

    /// Reset to `Idle` for the next utterance.
    pub fn reset(&mut self) {
        if matches!(
            self.state,
            TtsState::Completed | TtsState::Cancelled | TtsState::Error
        ) {
            self.transition(TtsState::Idle);
        }
    }

    pub async fn keepalive(&mut self) -> Result<(), TtsError> {
        if let Some(stream) = self.stream.as_mut() {
            stream.keepalive().await
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoTtsProvider;

    fn config() -> TtsConfig {
        TtsConfig {
            voice_id: None,
            sample_rate_hz: 16_000,
        }
    }

    #[tokio::test]
    async fn happy_path_reaches_completed() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());

        session.start("hi").await.unwrap();
        assert_eq!(session.state(), TtsState::Streaming);

        let mut chunks = Vec::new();
        loop {
            match session.next_chunk().await.unwrap() {
                Some(chunk) => {
                    let is_final = chunk.is_final;
                    chunks.push(chunk);
                    if is_final {
                        break;
                    }
                }
                None => break,
            }
        }
        assert_eq!(session.state(), TtsState::Completed);
        assert!(chunks.last().unwrap().is_final);
    }

    #[tokio::test]
    async fn cancel_only_applies_while_streaming() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());
        session.cancel();
        assert_eq!(session.state(), TtsState::Idle);

        session.start("hi").await.unwrap();
        session.cancel();
        assert_eq!(session.state(), TtsState::Cancelled);
    }

    #[tokio::test]
    async fn start_reuses_a_completed_session_for_the_next_utterance() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());

        session.start("first").await.unwrap();
        while session.next_chunk().await.unwrap().is_some() {}
        assert_eq!(session.state(), TtsState::Completed);

        session.start("second").await.unwrap();
        assert_eq!(session.state(), TtsState::Streaming);
    }

    #[tokio::test]
    async fn start_reuses_a_cancelled_session_for_the_next_utterance() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());

        session.start("first").await.unwrap();
        session.cancel();
        assert_eq!(session.state(), TtsState::Cancelled);

        session.start("second").await.unwrap();
        assert_eq!(session.state(), TtsState::Streaming);
    }

    #[tokio::test]
    async fn text_over_the_cap_is_truncated_and_still_synthesized() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());

        let too_long = "a".repeat(crate::provider::MAX_TEXT_CHARS + 1);
        session.start(&too_long).await.unwrap();
        assert_eq!(session.state(), TtsState::Streaming);

        let mut reassembled = Vec::new();
        while let Some(chunk) = session.next_chunk().await.unwrap() {
            reassembled.extend_from_slice(&chunk.audio);
            if chunk.is_final {
                break;
            }
        }
        assert_eq!(reassembled.len(), crate::provider::MAX_TEXT_CHARS);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let provider: Arc<dyn TtsProvider> = Arc::new(EchoTtsProvider::new());
        let mut session = TtsSession::new(provider, config());

        let err = session.start("   ").await.unwrap_err();
        assert!(matches!(err, TtsError::Rejected(_)));
    }
}
