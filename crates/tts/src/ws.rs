use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::TtsError;
use crate::provider::{TtsChunk, TtsConfig, TtsProvider, TtsStream};

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, WsMessage>;
type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

#[derive(Debug, Clone)]
pub struct WsTtsConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// A streaming TTS provider speaking a Doubao/Volcengine-style
/// bidirectional WebSocket protocol: a JSON `synthesize` request goes
/// out, binary audio frames and a final JSON completion frame come
/// back.
pub struct WsTtsProvider {
    config: WsTtsConfig,
}

impl WsTtsProvider {
    pub fn new(config: WsTtsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TtsProvider for WsTtsProvider {
    async fn connect(&self, config: TtsConfig) -> Result<Box<dyn TtsStream>, TtsError> {
        let url = format!(
            "{}?sample_rate={}&api_key={}",
            self.config.endpoint, config.sample_rate_hz, self.config.api_key
        );
        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| TtsError::ConnectFailed(e.to_string()))?;
        let (write, read) = ws_stream.split();

        Ok(Box::new(WsTtsStream {
            write: Arc::new(Mutex::new(write)),
            read: Arc::new(Mutex::new(read)),
            closed: Arc::new(AtomicBool::new(false)),
            voice_id: config.voice_id,
        }))
    }
}

struct WsTtsStream {
    write: Arc<Mutex<WsWrite>>,
    read: Arc<Mutex<WsRead>>,
    closed: Arc<AtomicBool>,
    voice_id: Option<String>,
}

#[async_trait]
impl TtsStream for WsTtsStream {
    async fn synthesize(&mut self, text: &str) -> Result<(), TtsError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TtsError::ConnectionLost("stream already closed".to_string()));
        }
        let req = SynthesizeRequest {
            text,
            voice_id: self.voice_id.as_deref(),
        };
        let msg = WsMessage::Text(
            serde_json::to_string(&req).map_err(|e| TtsError::SendFailed(e.to_string()))?,
        );
        self.write
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| TtsError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<TtsChunk, TtsError>> {
        loop {
            let msg = self.read.lock().await.next().await;
            match msg {
                None => {
                    self.closed.store(true, Ordering::Relaxed);
                    return None;
                }
                Some(Err(e)) => {
                    self.closed.store(true, Ordering::Relaxed);
                    return Some(Err(TtsError::ConnectionLost(e.to_string())));
                }
                Some(Ok(WsMessage::Binary(audio))) => {
                    return Some(Ok(TtsChunk {
                        audio,
                        is_final: false,
                    }))
                }
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<CompletionFrame>(&text) {
                        Ok(frame) if frame.event == "complete" => {
                            return Some(Ok(TtsChunk {
                                audio: Vec::new(),
                                is_final: true,
                            }))
                        }
                        Ok(_) => continue,
                        Err(e) => return Some(Err(TtsError::ConnectionLost(e.to_string()))),
                    }
                }
                Some(Ok(WsMessage::Close(_))) => {
                    self.closed.store(true, Ordering::Relaxed);
                    return None;
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn keepalive(&mut self) -> Result<(), TtsError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TtsError::ConnectionLost("stream already closed".to_string()));
        }
        self.write
            .lock()
            .await
            .send(WsMessage::Ping(Vec::new()))
            .await
            .map_err(|e| TtsError::SendFailed(e.to_string()))
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    #[serde(rename = "voiceId", skip_serializing_if = "Option::is_none")]
    voice_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct CompletionFrame {
    event: String,
}
