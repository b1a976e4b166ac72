use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::SttError;
use crate::provider::{SttConfig, SttEvent, SttProvider, SttStream};

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, WsMessage>;
type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Credentials and endpoint for the networked streaming STT provider.
#[derive(Debug, Clone)]
pub struct WsSttConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// A streaming STT provider speaking a Doubao/Volcengine-style
/// bidirectional WebSocket protocol: a JSON `start` frame establishes
/// the session, then binary audio frames stream in and JSON result
/// frames stream out.
pub struct WsSttProvider {
    config: WsSttConfig,
}

impl WsSttProvider {
    pub fn new(config: WsSttConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SttProvider for WsSttProvider {
    async fn connect(&self, config: SttConfig) -> Result<Box<dyn SttStream>, SttError> {
        let url = format!(
            "{}?sample_rate={}&api_key={}",
            self.config.endpoint, config.sample_rate_hz, self.config.api_key
        );

        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| SttError::ConnectFailed(e.to_string()))?;
        let (write, read) = ws_stream.split();

        let session = WsSttStream {
            write: Arc::new(Mutex::new(write)),
            read: Arc::new(Mutex::new(read)),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let start = StartFrame {
            audio: AudioParams {
                sample_rate: config.sample_rate_hz,
                format: "pcm_s16le",
            },
            request: RequestParams {
                language: config.language.as_deref().unwrap_or("en-US"),
            },
        };
        let msg = WsMessage::Text(
            serde_json::to_string(&start).map_err(|e| SttError::ConnectFailed(e.to_string()))?,
        );
        session
            .write
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| SttError::ConnectFailed(e.to_string()))?;

        Ok(Box::new(session))
    }
}

struct WsSttStream {
    write: Arc<Mutex<WsWrite>>,
    read: Arc<Mutex<WsRead>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl SttStream for WsSttStream {
    async fn send_audio(&mut self, pcm16le: &[u8]) -> Result<(), SttError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(SttError::ConnectionLost("stream already closed".to_string()));
        }
        self.write
            .lock()
            .await
            .send(WsMessage::Binary(pcm16le.to_vec()))
            .await
            .map_err(|e| SttError::SendFailed(e.to_string()))
    }

    async fn finish(&mut self) -> Result<(), SttError> {
        self.write
            .lock()
            .await
            .send(WsMessage::Text("{\"event\":\"finish\"}".to_string()))
            .await
            .map_err(|e| SttError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<SttEvent, SttError>> {
        loop {
            let msg = self.read.lock().await.next().await;
            match msg {
                None => {
                    self.closed.store(true, Ordering::Relaxed);
                    return None;
                }
                Some(Err(e)) => {
                    self.closed.store(true, Ordering::Relaxed);
                    return Some(Err(SttError::ConnectionLost(e.to_string())));
                }
                Some(Ok(WsMessage::Text(text))) => {
                    let parsed: Result<ResultFrame, _> = serde_json::from_str(&text);
                    match parsed {
                        Ok(frame) if frame.is_final => {
                            return Some(Ok(SttEvent::Final(frame.text)))
                        }
                        Ok(frame) => return Some(Ok(SttEvent::Partial(frame.text))),
                        Err(e) => return Some(Err(SttError::MalformedResult(e.to_string()))),
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
}

#[derive(Serialize)]
struct StartFrame<'a> {
    audio: AudioParams<'a>,
    request: RequestParams<'a>,
}

#[derive(Serialize)]
struct AudioParams<'a> {
    sample_rate: u32,
    format: &'a str,
}

#[derive(Serialize)]
struct RequestParams<'a> {
    language: &'a str,
}

#[derive(Deserialize)]
struct ResultFrame {
    text: String,
    #[serde(default, rename = "isFinal")]
    is_final: bool,
}
