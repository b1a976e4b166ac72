use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SttError;
use crate::provider::{SttConfig, SttEvent, SttProvider, SttStream};

/// A loopback STT provider for local development and tests: it never
/// makes a network connection, and reports back the byte count of the
/// audio it received as its "transcript" once `finish` is called.
///
/// This keeps the Orchestrator's control flow exercised end to end
/// without a live provider credential, mirroring the same echo/loopback
/// pattern used for the TTS and LLM engines.
#[derive(Debug, Default)]
pub struct EchoSttProvider;

impl EchoSttProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SttProvider for EchoSttProvider {
    async fn connect(&self, _config: SttConfig) -> Result<Box<dyn SttStream>, SttError> {
        Ok(Box::new(EchoSttStream::new()))
    }
}

pub struct EchoSttStream {
    bytes_received: usize,
    events: mpsc::UnboundedReceiver<SttEvent>,
    sender: mpsc::UnboundedSender<SttEvent>,
    finished: bool,
}

impl EchoSttStream {
    fn new() -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        Self {
            bytes_received: 0,
            events,
            sender,
            finished: false,
        }
    }
}

#[async_trait]
impl SttStream for EchoSttStream {
    async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), SttError> {
        self.bytes_received += pcm16le.len();
        let _ = self
            .sender
            .send(SttEvent::Partial(format!("{} bytes received", self.bytes_received)));
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SttError> {
        if !self.finished {
            self.finished = true;
            let _ = self
                .sender
                .send(SttEvent::Final(format!("echo: {} bytes", self.bytes_received)));
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<SttEvent, SttError>> {
        self.events.recv().await.map(Ok)
    }
}
