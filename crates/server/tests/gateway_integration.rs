//! End-to-end Connection Gateway scenarios (spec.md §8) driven over a
//! real TCP socket with a `tokio-tungstenite` client, against a router
//! wired to the echo/loopback STT, TTS, and LLM providers the same way
//! `main.rs` wires it when no provider endpoint is configured.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use voicegate_llm::{EchoLlmProvider, LlmContext, LlmEngine};
use voicegate_server::{create_router, AppState};
use voicegate_session::SessionRegistry;
use voicegate_stt::EchoSttProvider;
use voicegate_tts::EchoTtsProvider;

/// Spin up the real router on an ephemeral port and return its address.
/// The server task is intentionally leaked for the test's lifetime —
/// the process exits with it.
async fn spawn_server() -> SocketAddr {
    let settings = Arc::new(voicegate_config::Settings::default());
    let state = AppState::new(
        settings,
        Arc::new(SessionRegistry::new(
            Duration::from_secs(60),
            Duration::from_secs(3600),
        )),
        Arc::new(EchoSttProvider::new()),
        Arc::new(EchoTtsProvider::new()),
        Arc::new(LlmEngine::new(
            Arc::new(EchoLlmProvider::new()),
            Arc::new(LlmContext::new(50, Duration::from_secs(1800))),
        )),
    );
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("server exited");
    });

    addr
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmptyPayload {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioStartPayload {
    sampling_rate: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioChunkPayload {
    audio: serde_bytes::ByteBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvalidAudioChunkPayload {
    audio: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Wire<'a, T> {
    event_type: &'a str,
    event_id: &'a str,
    payload: T,
}

fn encode<T: Serialize>(event_type: &str, event_id: &str, payload: T) -> WsMessage {
    let bytes = rmp_serde::to_vec_named(&Wire {
        event_type,
        event_id,
        payload,
    })
    .expect("encode");
    WsMessage::Binary(bytes)
}

/// Decode a server frame's envelope fields plus its payload as a loose
/// JSON value, since the test doesn't need a typed client-side codec.
fn decode(bytes: &[u8]) -> serde_json::Value {
    rmp_serde::from_slice(bytes).expect("decode server frame")
}

async fn next_frame(
    socket: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> serde_json::Value {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("ws error")
        {
            WsMessage::Binary(bytes) => return decode(&bytes),
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

/// Scenario 1 (happy path): `audio.start` → ack, `audio.chunk` ×N,
/// `audio.end` → ack, then an asynchronous `response.start` /
/// `response.chunk`* / `response.complete` sharing one `utteranceId`.
#[tokio::test]
async fn happy_path_streams_a_full_response() {
    let addr = spawn_server().await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/voicechat"))
        .await
        .expect("connect");

    let ack = next_frame(&mut socket).await;
    assert_eq!(ack["eventType"], "voicechat.connection.ack");
    let session_id = ack["payload"]["sessionId"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    socket
        .send(encode(
            "voicechat.audio.start",
            "e1",
            AudioStartPayload { sampling_rate: 48_000 },
        ))
        .await
        .expect("send audio.start");
    let start_ack = next_frame(&mut socket).await;
    assert_eq!(start_ack["eventType"], "voicechat.audio.start.ack");
    assert_eq!(start_ack["eventId"], "e1");

    socket
        .send(encode(
            "voicechat.audio.chunk",
            "e2",
            AudioChunkPayload {
                audio: serde_bytes::ByteBuf::from(vec![0u8; 9_600]),
            },
        ))
        .await
        .expect("send audio.chunk");

    socket
        .send(encode("voicechat.audio.end", "e3", EmptyPayload {}))
        .await
        .expect("send audio.end");
    let end_ack = next_frame(&mut socket).await;
    assert_eq!(end_ack["eventType"], "voicechat.audio.end.ack");
    assert_eq!(end_ack["eventId"], "e3");

    let response_start = next_frame(&mut socket).await;
    assert_eq!(response_start["eventType"], "voicechat.response.start");
    let utterance_id = response_start["payload"]["utteranceId"]
        .as_str()
        .unwrap()
        .to_string();
    let response_event_id = response_start["eventId"].as_str().unwrap().to_string();

    let mut saw_complete = false;
    for _ in 0..64 {
        let frame = next_frame(&mut socket).await;
        assert_eq!(frame["eventId"], response_event_id);
        assert_eq!(frame["payload"]["utteranceId"], utterance_id);
        match frame["eventType"].as_str().unwrap() {
            "voicechat.response.chunk" => continue,
            "voicechat.response.complete" => {
                saw_complete = true;
                break;
            }
            other => panic!("unexpected frame type mid-response: {other}"),
        }
    }
    assert!(saw_complete, "response never reached response.complete");
}

/// Scenario 2 (interrupt): a new `audio.start` mid-response cancels the
/// in-flight utterance and the channel keeps working afterward.
#[tokio::test]
async fn interrupt_cancels_the_in_flight_response() {
    let addr = spawn_server().await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/voicechat"))
        .await
        .expect("connect");
    next_frame(&mut socket).await; // connection.ack

    socket
        .send(encode(
            "voicechat.audio.start",
            "e1",
            AudioStartPayload { sampling_rate: 16_000 },
        ))
        .await
        .unwrap();
    next_frame(&mut socket).await; // audio.start.ack

    socket
        .send(encode("voicechat.audio.end", "e2", EmptyPayload {}))
        .await
        .unwrap();
    next_frame(&mut socket).await; // audio.end.ack
    next_frame(&mut socket).await; // response.start

    // Barge in immediately: a new audio.start before the response
    // finishes streaming.
    socket
        .send(encode(
            "voicechat.audio.start",
            "e3",
            AudioStartPayload { sampling_rate: 16_000 },
        ))
        .await
        .unwrap();

    let mut saw_interrupt = false;
    for _ in 0..16 {
        let frame = next_frame(&mut socket).await;
        match frame["eventType"].as_str().unwrap() {
            "voicechat.response.interrupt" => {
                saw_interrupt = true;
                break;
            }
            "voicechat.response.chunk" | "voicechat.response.complete" => continue,
            "voicechat.audio.start.ack" => continue,
            other => panic!("unexpected frame type: {other}"),
        }
    }
    assert!(saw_interrupt, "expected a response.interrupt after barge-in");
}

/// Scenario 6 (invalid payload): a non-binary `audio` field on
/// `audio.chunk` is rejected with `invalidPayload`, echoing the
/// triggering frame's `eventId` and `requestType`.
#[tokio::test]
async fn invalid_audio_payload_is_rejected() {
    let addr = spawn_server().await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/voicechat"))
        .await
        .expect("connect");
    next_frame(&mut socket).await; // connection.ack

    socket
        .send(encode(
            "voicechat.audio.chunk",
            "bad-1",
            InvalidAudioChunkPayload {
                audio: "not-binary".to_string(),
            },
        ))
        .await
        .unwrap();

    let error = next_frame(&mut socket).await;
    assert_eq!(error["eventType"], "voicechat.error");
    assert_eq!(error["eventId"], "bad-1");
    assert_eq!(error["payload"]["requestType"], "voicechat.audio.chunk");
}
