//! Connection Gateway (spec.md §4.D): accepts channels, performs the
//! handshake, and dispatches inbound frames to the per-session
//! [`Turn`]. Modeled on the teacher's `WebSocketHandler` — split the
//! socket into a shared writer half and a read loop, spawn a task per
//! connection, tear everything down together when the socket closes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

use voicegate_codec::{ClientFrame, ServerFrame};
use voicegate_core::audio::{SampleRate, TARGET_SAMPLE_RATE};
use voicegate_core::{ConnectionId, ErrorCode};
use voicegate_orchestrator::{OrchestratorEvent, RealLlmHandle, RealSttHandle, RealTtsHandle, Turn};
use voicegate_session::{Session, SessionMetadata};
use voicegate_stt::{SttConfig, SttSession};
use voicegate_tts::{TtsConfig, TtsSession};

use crate::metrics;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let max_payload = state.settings.server.max_payload_bytes;
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ws.max_message_size(max_payload)
        .on_upgrade(move |socket| handle_socket(socket, state, addr, user_agent))
}

/// Per-connection mutable bits the read loop and the response-draining
/// task both need: the declared client sample rate (set by
/// `audio.start`, read by every later `audio.chunk`) and the `eventId`
/// shared by every frame of the utterance currently streaming out, so
/// a barge-in's `response.interrupt` can reference it.
struct ConnectionContext {
    session: Arc<Session>,
    turn: Mutex<Option<Turn>>,
    declared_sample_rate: AtomicU32,
    current_response_event_id: Mutex<Option<String>>,
    outbound: mpsc::Sender<Vec<u8>>,
}

async fn handle_socket(socket: WebSocket, state: AppState, addr: SocketAddr, user_agent: Option<String>) {
    let total = state.note_new_connection();
    metrics::record_active_connections(total as usize);

    let connection_id = ConnectionId::new();
    let session = state.session_registry.create(connection_id, SessionMetadata::default());
    session.set_connection_info(Some(addr.to_string()), user_agent);
    tracing::info!(%connection_id, session_id = %session.id, %addr, "channel accepted");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(64);

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Binary(bytes)).await {
                tracing::warn!(error = %e, "dropping outbound frame: channel not open");
                break;
            }
        }
    });

    // `connection.ack` carries a freshly generated eventId and no
    // sessionId echo field on the envelope itself (spec.md §4.A) — the
    // new sessionId lives in the payload.
    let ack_event_id = Uuid::new_v4().to_string();
    if let Err(e) = send_frame(
        &outbound_tx,
        &ServerFrame::ConnectionAck {
            session_id: session.id.to_string(),
        },
        &ack_event_id,
        None,
    )
    .await
    {
        tracing::warn!(error = %e, "failed to encode connection.ack");
    }

    let ctx = Arc::new(ConnectionContext {
        session: session.clone(),
        turn: Mutex::new(None),
        declared_sample_rate: AtomicU32::new(TARGET_SAMPLE_RATE),
        current_response_event_id: Mutex::new(None),
        outbound: outbound_tx,
    });

    let keepalive_interval = Duration::from_secs(state.settings.tts.keepalive_interval_secs);
    let keepalive_shutdown = spawn_keepalive_task(ctx.clone(), keepalive_interval);

    let rate_limit_config = RateLimitConfig::default();
    let mut rate_limiter = RateLimiter::new(rate_limit_config);

    while let Some(message) = ws_receiver.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "channel read error, closing");
                break;
            }
        };

        let bytes = match message {
            Message::Binary(bytes) => bytes,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Text(_) => {
                tracing::warn!("dropped a text frame: this channel only accepts binary MessagePack frames");
                continue;
            }
        };

        if let Err(e) = rate_limiter.check_message() {
            metrics::record_dropped_frame("rate_limited");
            tracing::warn!(error = %e, session_id = %session.id, "dropping inbound frame: rate limit exceeded");
            continue;
        }
        if let Err(e) = rate_limiter.check_audio(bytes.len()) {
            metrics::record_dropped_frame("rate_limited");
            tracing::warn!(error = %e, session_id = %session.id, "dropping inbound frame: rate limit exceeded");
            continue;
        }

        session.touch();
        dispatch_frame(&state, &ctx, &bytes).await;
    }

    let _ = keepalive_shutdown.send(true);
    writer_task.abort();
    state.session_registry.remove_connection(connection_id);
    state.llm_engine.clear_session(session.id);
    let remaining = state.session_registry.len();
    metrics::record_active_sessions(remaining);
    tracing::info!(%connection_id, session_id = %session.id, "channel closed, session torn down");
}

/// Spawn the per-connection keepalive loop (spec.md §4.F/§5): while the
/// TTS session is idle between utterances, ping the provider connection
/// every `interval` so it doesn't time out waiting for the next
/// utterance. Mirrors the session registry's/LLM context's own
/// `watch`-driven sweep task shape.
fn spawn_keepalive_task(ctx: Arc<ConnectionContext>, interval: Duration) -> watch::Sender<bool> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut turn_slot = ctx.turn.lock().await;
                    if let Some(turn) = turn_slot.as_mut() {
                        turn.keepalive_tts().await;
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    shutdown_tx
}

/// Decode one inbound frame and dispatch it by `eventType`. Any decode
/// or handler failure is captured and turned into a client-facing error
/// frame rather than closing the channel (spec.md §4.D, §7).
async fn dispatch_frame(state: &AppState, ctx: &Arc<ConnectionContext>, bytes: &[u8]) {
    let frame = match voicegate_codec::decode(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting frame: {e}");
            let outgoing_event_id = e.event_id().unwrap_or("unknown").to_string();
            if let Ok(encoded) = voicegate_codec::encode_decode_error(&e, &outgoing_event_id) {
                let _ = ctx.outbound.send(encoded).await;
            }
            metrics::record_error(ErrorCode::InvalidPayload.as_str());
            return;
        }
    };

    metrics::record_request(frame.event_type());

    match frame {
        ClientFrame::AudioStart { event_id, payload, .. } => {
            on_audio_start(state, ctx, event_id, payload.sampling_rate, payload.language, payload.voice_id).await;
        }
        ClientFrame::AudioChunk { event_id, payload, .. } => {
            on_audio_chunk(ctx, event_id, payload.audio.into_vec(), payload.is_muted.unwrap_or(false)).await;
        }
        ClientFrame::AudioEnd { event_id, .. } => {
            on_audio_end(ctx, event_id).await;
        }
    }
}

async fn on_audio_start(
    state: &AppState,
    ctx: &Arc<ConnectionContext>,
    event_id: String,
    sampling_rate: Option<u32>,
    language: Option<String>,
    voice_id: Option<String>,
) {
    let declared_rate = match sampling_rate {
        Some(hz) => match SampleRate::parse(hz) {
            Some(rate) => rate.hz(),
            None => {
                send_error(
                    ctx,
                    ErrorCode::InvalidPayload,
                    format!("samplingRate {hz} out of range [8000, 48000]"),
                    "voicechat.audio.start",
                    &event_id,
                )
                .await;
                return;
            }
        },
        None => TARGET_SAMPLE_RATE,
    };
    ctx.declared_sample_rate.store(declared_rate, Ordering::Relaxed);
    ctx.session.set_metadata(Some(declared_rate), voice_id.clone(), language.clone());

    {
        let mut turn_slot = ctx.turn.lock().await;
        if turn_slot.is_none() {
            *turn_slot = Some(build_turn(state, &ctx.session, language, voice_id));
            ctx.session.mark_stt_attached();
            ctx.session.mark_tts_attached();
            ctx.session.mark_llm_attached();
            state
                .llm_engine
                .initialize(ctx.session.id, state.settings.llm.system_prompt.clone());
        }
        ctx.session.activate();

        let events = turn_slot.as_mut().expect("just populated").on_audio_start().await;
        drop(turn_slot);
        emit_events(ctx, &event_id, events).await;
    }
}

async fn on_audio_chunk(ctx: &Arc<ConnectionContext>, event_id: String, audio: Vec<u8>, is_muted: bool) {
    if is_muted {
        return;
    }

    let mut turn_slot = ctx.turn.lock().await;
    let Some(turn) = turn_slot.as_mut() else {
        tracing::warn!(session_id = %ctx.session.id, "audio.chunk before audio.start, dropping");
        return;
    };

    let declared_rate = ctx.declared_sample_rate.load(Ordering::Relaxed);
    let resampled = voicegate_audio::resample_pcm16(ctx.session.id, &audio, declared_rate);
    let events = turn.on_audio_chunk(&resampled).await;
    drop(turn_slot);
    emit_events(ctx, &event_id, events).await;
}

async fn on_audio_end(ctx: &Arc<ConnectionContext>, event_id: String) {
    let mut turn_slot = ctx.turn.lock().await;
    let Some(turn) = turn_slot.as_mut() else {
        tracing::warn!(session_id = %ctx.session.id, "audio.end before audio.start, dropping");
        return;
    };

    let events = turn.on_audio_end().await;
    drop(turn_slot);

    let started_response = events
        .iter()
        .any(|e| matches!(e, OrchestratorEvent::ResponseStart { .. }));
    emit_events(ctx, &event_id, events).await;

    if started_response {
        spawn_response_drain(ctx.clone());
    }
}

/// Translate [`OrchestratorEvent`]s into wire frames. ACKs and errors
/// echo the triggering request's `eventId`; response-lifecycle events
/// share one freshly generated `eventId` per utterance, tracked in
/// `current_response_event_id` so a later `response.interrupt` (raised
/// out of band by the *next* `audio.start`) can still reference it.
async fn emit_events(ctx: &Arc<ConnectionContext>, request_event_id: &str, events: Vec<OrchestratorEvent>) {
    for event in events {
        match event {
            OrchestratorEvent::Ack { request_event_type } => {
                send_frame(
                    &ctx.outbound,
                    &ServerFrame::Ack {
                        request_event_type: request_event_type.to_string(),
                    },
                    request_event_id,
                    Some(&ctx.session.id.to_string()),
                )
                .await
                .ok();
            }
            OrchestratorEvent::ResponseStart { utterance_id } => {
                let response_event_id = Uuid::new_v4().to_string();
                *ctx.current_response_event_id.lock().await = Some(response_event_id.clone());
                send_frame(
                    &ctx.outbound,
                    &ServerFrame::ResponseStart { utterance_id },
                    &response_event_id,
                    Some(&ctx.session.id.to_string()),
                )
                .await
                .ok();
            }
            OrchestratorEvent::ResponseChunk {
                utterance_id,
                audio,
                sample_rate,
            } => {
                let declared_rate = ctx.declared_sample_rate.load(Ordering::Relaxed);
                let resampled = voicegate_audio::resample_pcm16_to(ctx.session.id, &audio, sample_rate, declared_rate).into_owned();
                send_response_lifecycle_frame(
                    ctx,
                    ServerFrame::ResponseChunk {
                        utterance_id,
                        audio: resampled,
                        sample_rate: declared_rate,
                    },
                )
                .await;
            }
            OrchestratorEvent::ResponseComplete { utterance_id } => {
                send_response_lifecycle_frame(ctx, ServerFrame::ResponseComplete { utterance_id }).await;
                *ctx.current_response_event_id.lock().await = None;
            }
            OrchestratorEvent::ResponseInterrupt { utterance_id } => {
                send_response_lifecycle_frame(ctx, ServerFrame::ResponseInterrupt { utterance_id }).await;
                *ctx.current_response_event_id.lock().await = None;
            }
            OrchestratorEvent::Error {
                code,
                message,
                request_type,
            } => {
                metrics::record_error(code.as_str());
                send_frame(
                    &ctx.outbound,
                    &ServerFrame::Error {
                        code,
                        message,
                        request_type,
                    },
                    request_event_id,
                    Some(&ctx.session.id.to_string()),
                )
                .await
                .ok();
            }
        }
    }
}

async fn send_response_lifecycle_frame(ctx: &Arc<ConnectionContext>, frame: ServerFrame) {
    let event_id = ctx
        .current_response_event_id
        .lock()
        .await
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    send_frame(&ctx.outbound, &frame, &event_id, Some(&ctx.session.id.to_string()))
        .await
        .ok();
}

/// Poll the in-flight TTS response until it completes, is interrupted,
/// or errors. Runs as its own task so `audio.chunk` handling (and a
/// barge-in interrupt) can keep making progress on the same `Turn`
/// concurrently; both sides serialize through the same `Mutex`.
fn spawn_response_drain(ctx: Arc<ConnectionContext>) {
    tokio::spawn(async move {
        loop {
            let (event, still_active) = {
                let mut turn_slot = ctx.turn.lock().await;
                let Some(turn) = turn_slot.as_mut() else {
                    return;
                };
                let event = turn.next_tts_event().await;
                (event, turn.is_response_active())
            };

            match event {
                Some(event) => {
                    let terminal = matches!(
                        event,
                        OrchestratorEvent::ResponseComplete { .. }
                            | OrchestratorEvent::ResponseInterrupt { .. }
                            | OrchestratorEvent::Error { .. }
                    );
                    emit_events(&ctx, "", vec![event]).await;
                    if terminal {
                        return;
                    }
                }
                None => {
                    if !still_active {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    });
}

async fn send_error(
    ctx: &Arc<ConnectionContext>,
    code: ErrorCode,
    message: String,
    request_type: &str,
    event_id: &str,
) {
    metrics::record_error(code.as_str());
    let _ = send_frame(
        &ctx.outbound,
        &ServerFrame::Error {
            code,
            message,
            request_type: request_type.to_string(),
        },
        event_id,
        Some(&ctx.session.id.to_string()),
    )
    .await;
}

async fn send_frame(
    outbound: &mpsc::Sender<Vec<u8>>,
    frame: &ServerFrame,
    event_id: &str,
    session_id: Option<&str>,
) -> Result<(), voicegate_codec::CodecError> {
    let bytes = voicegate_codec::encode(frame, event_id, session_id)?;
    if outbound.send(bytes).await.is_err() {
        tracing::warn!("dropping outbound frame: writer task is gone");
    }
    Ok(())
}

/// Build a fresh [`Turn`] wired to this session's real STT/TTS/LLM
/// handles. The Gateway always forwards STT audio already resampled to
/// the fixed 16 kHz target (spec.md §4.B, §4.E), so `SttConfig` never
/// varies with the client's declared rate; only `language`/`voiceId`
/// come from the `audio.start` payload.
fn build_turn(
    state: &AppState,
    session: &Arc<Session>,
    language: Option<String>,
    voice_id: Option<String>,
) -> Turn {
    let stt_session = SttSession::new(
        state.stt_provider.clone(),
        SttConfig {
            sample_rate_hz: TARGET_SAMPLE_RATE,
            language,
        },
    );
    let tts_session = TtsSession::new(
        state.tts_provider.clone(),
        TtsConfig {
            voice_id,
            sample_rate_hz: TARGET_SAMPLE_RATE,
        },
    );

    Turn::new(
        Box::new(RealSttHandle::new(stt_session)),
        Box::new(RealTtsHandle::new(tts_session, TARGET_SAMPLE_RATE)),
        Box::new(RealLlmHandle::new(state.llm_engine.clone(), session.id)),
    )
}
