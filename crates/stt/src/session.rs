use std::sync::Arc;

use tracing::{info, warn};

use crate::backoff::{delay_for_attempt, CONNECT_BACKOFF_MS, RECONNECT_BACKOFF_MS};
use crate::error::{SttError, SttFailureKind};
use crate::provider::{SttConfig, SttEvent, SttProvider, SttStream};
use crate::transcript::TranscriptAssembler;

/// Drives a single utterance's STT session: connects with retry,
/// streams audio in, assembles the transcript, and reconnects
/// mid-stream on a transient drop rather than failing the whole turn.
pub struct SttSession {
    provider: Arc<dyn SttProvider>,
    config: SttConfig,
    stream: Option<Box<dyn SttStream>>,
    transcript: TranscriptAssembler,
}

impl SttSession {
    pub fn new(provider: Arc<dyn SttProvider>, config: SttConfig) -> Self {
        Self {
            provider,
            config,
            stream: None,
            transcript: TranscriptAssembler::new(),
        }
    }

    /// Connect following the connect backoff schedule, giving up only
    /// after the whole schedule is exhausted with no success.
    pub async fn connect(&mut self) -> Result<(), SttError> {
        self.connect_with_schedule(CONNECT_BACKOFF_MS).await
    }

    async fn connect_with_schedule(&mut self, schedule: &[u64]) -> Result<(), SttError> {
        let mut last_err = None;
        for attempt in 0..schedule.len() {
            if attempt > 0 {
                tokio::time::sleep(delay_for_attempt(schedule, attempt)).await;
            }
            match self.provider.connect(self.config.clone()).await {
                Ok(stream) => {
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    let fatal = e.kind() == SttFailureKind::Fatal;
                    warn!(attempt, error = %e, "STT connect attempt failed");
                    let retry_exhausted = fatal;
                    last_err = Some(e);
                    if retry_exhausted {
                        break;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(SttError::ConnectFailed("no attempts made".to_string())))
    }

    /// Reconnect mid-utterance after the stream drops, using the
    /// shorter reconnection schedule since a turn is already underway.
    pub async fn reconnect(&mut self) -> Result<(), SttError> {
        self.connect_with_schedule(RECONNECT_BACKOFF_MS).await
    }

    pub async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), SttError> {
        let result = {
            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| SttError::ConnectionLost("not connected".to_string()))?;
            stream.send_audio(pcm16le).await
        };
        match result {
            Err(e) if e.kind() == SttFailureKind::Retryable => {
                warn!(error = %e, "STT stream dropped mid-utterance, reconnecting");
                self.reconnect().await?;
                let stream = self.stream.as_mut().expect("just reconnected");
                stream.send_audio(pcm16le).await
            }
            other => other,
        }
    }

    pub async fn finish(&mut self) -> Result<(), SttError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SttError::ConnectionLost("not connected".to_string()))?;
        stream.finish().await
    }

    /// Pull the next recognition event, folding partials/finals into
    /// the running transcript. Returns `None` once the provider closes
    /// the stream with no further events.
    pub async fn next_event(&mut self) -> Option<Result<SttEvent, SttError>> {
        loop {
            let stream = self.stream.as_mut()?;
            let event = stream.recv().await?;
            match event {
                Ok(ev) => {
                    match &ev {
                        SttEvent::Partial(text) | SttEvent::Final(text) => self.transcript.push(text),
                    }
                    if let SttEvent::Final(_) = ev {
                        info!(
                            chars = self.transcript.as_str().len(),
                            truncated = self.transcript.was_truncated(),
                            "STT final transcript assembled"
                        );
                    }
                    return Some(Ok(ev));
                }
                Err(e) if e.kind() == SttFailureKind::Retryable => {
                    warn!(error = %e, "STT stream dropped mid-utterance, reconnecting");
                    if let Err(reconnect_err) = self.reconnect().await {
                        return Some(Err(reconnect_err));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    pub fn transcript(&self) -> &str {
        self.transcript.as_str()
    }
}
