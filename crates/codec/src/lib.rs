//! The binary framed envelope codec for the voice conversation channel
//! (spec.md §4.A).
//!
//! Every frame crossing the channel — either direction — is a single
//! MessagePack map with four top-level fields: `eventType`, `eventId`,
//! `sessionId`, `payload`. Decoding is a two-pass operation:
//!
//! 1. [`raw_check`] deserializes only the three envelope fields, using
//!    [`serde::de::IgnoredAny`] for `payload` so a malformed or
//!    oversized payload never gets touched before the envelope itself
//!    is known to be well-typed.
//! 2. [`client::decode_typed`] re-parses the same bytes into the full
//!    typed shape for the now-known `eventType`.
//!
//! This keeps binary audio payloads genuinely binary end to end —
//! nothing here ever round-trips audio through a JSON/base64 detour.

mod client;
mod error;
mod server;

pub use client::{AudioChunkPayload, AudioEndPayload, AudioStartPayload, ClientFrame};
pub use error::CodecError;
pub use server::ServerFrame;

use serde::{Deserialize, Serialize};
use server::{
    AckPayload, ConnectionAckPayload, ErrorPayload, ResponseChunkPayload,
    ResponseCompletePayload, ResponseInterruptPayload, ResponseStartPayload,
};

/// The envelope shape used only to validate `eventType`/`eventId`/
/// `sessionId` before committing to a typed payload decode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelopeCheck {
    event_type: serde_json::Value,
    event_id: serde_json::Value,
    #[serde(default)]
    session_id: serde_json::Value,
    #[serde(default)]
    payload: serde::de::IgnoredAny,
}

struct ValidatedEnvelope {
    event_type: String,
    event_id: String,
    session_id: Option<String>,
}

fn validate_envelope(bytes: &[u8]) -> Result<ValidatedEnvelope, CodecError> {
    let raw: RawEnvelopeCheck =
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

    let event_type = raw
        .event_type
        .as_str()
        .ok_or_else(|| CodecError::Malformed("eventType is not a string".to_string()))?
        .to_string();

    let event_id = match raw.event_id.as_str() {
        Some(s) => s.to_string(),
        None => {
            return Err(CodecError::InvalidPayload {
                event_type,
                event_id: None,
            })
        }
    };

    let session_id = match raw.session_id {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        _ => {
            return Err(CodecError::InvalidPayload {
                event_type,
                event_id: Some(event_id),
            })
        }
    };

    Ok(ValidatedEnvelope {
        event_type,
        event_id,
        session_id,
    })
}

/// Decode a raw inbound frame into a [`ClientFrame`].
///
/// Rejects anything whose `eventType`/`eventId`/`sessionId` are not
/// strings, and anything whose payload does not match the shape its
/// `eventType` requires, per spec.md §4.A / §7.
pub fn decode(bytes: &[u8]) -> Result<ClientFrame, CodecError> {
    let envelope = validate_envelope(bytes)?;
    client::decode_typed(
        bytes,
        &envelope.event_type,
        envelope.event_id,
        envelope.session_id,
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T> {
    event_type: String,
    event_id: &'a str,
    session_id: Option<&'a str>,
    payload: T,
}

fn encode_envelope<T: Serialize>(
    event_type: String,
    event_id: &str,
    session_id: Option<&str>,
    payload: T,
) -> Result<Vec<u8>, CodecError> {
    let envelope = Envelope {
        event_type,
        event_id,
        session_id,
        payload,
    };
    rmp_serde::to_vec_named(&envelope).map_err(|e| CodecError::EncodeFailed(e.to_string()))
}

/// Encode an outbound frame onto the wire.
///
/// `event_id` is the id the server assigns to this outgoing frame
/// (independent of whatever id the triggering client frame carried);
/// `session_id` is the session this frame belongs to — `None` only for
/// the very first `connection.ack` sent before a session exists.
pub fn encode(
    frame: &ServerFrame,
    event_id: &str,
    session_id: Option<&str>,
) -> Result<Vec<u8>, CodecError> {
    let event_type = frame.event_type();
    match frame {
        ServerFrame::ConnectionAck {
            session_id: new_session_id,
        } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ConnectionAckPayload {
                session_id: new_session_id,
            },
        ),
        ServerFrame::Ack { .. } => {
            encode_envelope(event_type, event_id, session_id, AckPayload {})
        }
        ServerFrame::ResponseStart { utterance_id } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ResponseStartPayload { utterance_id },
        ),
        ServerFrame::ResponseChunk {
            utterance_id,
            audio,
            sample_rate,
        } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ResponseChunkPayload::new(utterance_id, audio.clone(), *sample_rate),
        ),
        ServerFrame::ResponseComplete { utterance_id } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ResponseCompletePayload { utterance_id },
        ),
        ServerFrame::ResponseInterrupt { utterance_id } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ResponseInterruptPayload { utterance_id },
        ),
        ServerFrame::Error {
            message,
            request_type,
            ..
        } => encode_envelope(
            event_type,
            event_id,
            session_id,
            ErrorPayload {
                message,
                request_type,
            },
        ),
    }
}

/// Build the `voicechat.error` frame for a [`CodecError`] encountered
/// while decoding — the request's `eventType` becomes `requestType` in
/// the payload, and its `eventId` (when recoverable) becomes the
/// envelope `eventId` being replied to.
pub fn encode_decode_error(err: &CodecError, outgoing_event_id: &str) -> Result<Vec<u8>, CodecError> {
    let code = voicegate_core::ErrorCode::InvalidPayload;
    let frame = ServerFrame::Error {
        code,
        message: err.to_string(),
        request_type: err.event_type().to_string(),
    };
    encode(&frame, outgoing_event_id, None)
}
