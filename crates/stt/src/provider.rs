use async_trait::async_trait;

use crate::error::SttError;

/// Configuration for opening a streaming recognition session, distilled
/// from an `audio.start` frame.
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub sample_rate_hz: u32,
    pub language: Option<String>,
}

/// A piece of recognition output. Providers stream zero or more
/// `Partial`s followed by exactly one `Final` per utterance.
#[derive(Debug, Clone)]
pub enum SttEvent {
    Partial(String),
    Final(String),
}

/// A provider-agnostic capability for turning a live connection into a
/// streaming recognition session.
///
/// Exactly one trait, two implementations ([`crate::EchoSttProvider`] for
/// tests and local development, [`crate::WsSttProvider`] for the real
/// networked provider) so the Orchestrator never branches on which one
/// it was handed.
#[async_trait]
pub trait SttProvider: Send + Sync {
    async fn connect(&self, config: SttConfig) -> Result<Box<dyn SttStream>, SttError>;
}

/// A single open recognition session. Audio goes in via `send_audio`,
/// recognition events come out via `recv`; `finish` signals end-of-speech
/// so the provider can flush its final result.
#[async_trait]
pub trait SttStream: Send {
    async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), SttError>;
    async fn finish(&mut self) -> Result<(), SttError>;
    async fn recv(&mut self) -> Option<Result<SttEvent, SttError>>;
}
