use async_trait::async_trait;

use crate::error::TtsError;
use crate::provider::{TtsChunk, TtsConfig, TtsProvider, TtsStream};

const ECHO_CHUNK_BYTES: usize = 320;

/// A loopback TTS provider: "synthesizes" by replaying the UTF-8 bytes
/// of the input text back out as fixed-size chunks, so tests and local
/// development can exercise the full chunk/complete/interrupt control
/// flow without a live provider credential.
#[derive(Debug, Default)]
pub struct EchoTtsProvider;

impl EchoTtsProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsProvider for EchoTtsProvider {
    async fn connect(&self, _config: TtsConfig) -> Result<Box<dyn TtsStream>, TtsError> {
        Ok(Box::new(EchoTtsStream::default()))
    }
}

#[derive(Default)]
pub struct EchoTtsStream {
    remaining: Vec<u8>,
    done: bool,
}

#[async_trait]
impl TtsStream for EchoTtsStream {
    async fn synthesize(&mut self, text: &str) -> Result<(), TtsError> {
        self.remaining = text.as_bytes().to_vec();
        self.done = false;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<TtsChunk, TtsError>> {
        if self.done {
            return None;
        }
        if self.remaining.is_empty() {
            self.done = true;
            return Some(Ok(TtsChunk {
                audio: Vec::new(),
                is_final: true,
            }));
        }
        let take = ECHO_CHUNK_BYTES.min(self.remaining.len());
        let chunk: Vec<u8> = self.remaining.drain(..take).collect();
        let is_final = self.remaining.is_empty();
        if is_final {
            self.done = true;
        }
        Some(Ok(TtsChunk {
            audio: chunk,
            is_final,
        }))
    }

    async fn keepalive(&mut self) -> Result<(), TtsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_text_as_chunked_audio_ending_final() {
        let provider = EchoTtsProvider::new();
        let mut stream = provider
            .connect(TtsConfig {
                voice_id: None,
                sample_rate_hz: 16_000,
            })
            .await
            .unwrap();

        stream.synthesize("hello world").await.unwrap();

        let mut reassembled = Vec::new();
        let mut saw_final = false;
        while let Some(chunk) = stream.recv().await {
            let chunk = chunk.unwrap();
            reassembled.extend_from_slice(&chunk.audio);
            if chunk.is_final {
                saw_final = true;
                break;
            }
        }
        assert!(saw_final);
        assert_eq!(reassembled, b"hello world");
    }

}
