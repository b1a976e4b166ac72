//! Inbound (client → server) frames, spec.md §6.

use serde::Deserialize;
use serde_bytes::ByteBuf;

use crate::error::CodecError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStartPayload {
    #[serde(default)]
    pub sampling_rate: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunkPayload {
    pub audio: ByteBuf,
    #[serde(default)]
    pub is_muted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AudioEndPayload {}

/// A decoded, fully-typed inbound frame.
#[derive(Debug)]
pub enum ClientFrame {
    AudioStart {
        event_id: String,
        session_id: Option<String>,
        payload: AudioStartPayload,
    },
    AudioChunk {
        event_id: String,
        session_id: Option<String>,
        payload: AudioChunkPayload,
    },
    AudioEnd {
        event_id: String,
        session_id: Option<String>,
        payload: AudioEndPayload,
    },
}

impl ClientFrame {
    pub fn event_id(&self) -> &str {
        match self {
            Self::AudioStart { event_id, .. }
            | Self::AudioChunk { event_id, .. }
            | Self::AudioEnd { event_id, .. } => event_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AudioStart { .. } => "voicechat.audio.start",
            Self::AudioChunk { .. } => "voicechat.audio.chunk",
            Self::AudioEnd { .. } => "voicechat.audio.end",
        }
    }
}

/// The payload-only shape; `eventId`/`sessionId` have already been
/// extracted and validated by the caller's raw pre-check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypedEnvelope<T> {
    #[serde(default)]
    pub event_id: serde_json::Value,
    #[serde(default)]
    pub session_id: serde_json::Value,
    pub payload: T,
}

/// Decode `bytes` into the payload shape for a known, already-validated
/// `event_type`/`event_id`/`session_id`. Only the payload can still fail
/// here (e.g. `audio` not being a byte string).
pub(crate) fn decode_typed(
    bytes: &[u8],
    event_type: &str,
    event_id: String,
    session_id: Option<String>,
) -> Result<ClientFrame, CodecError> {
    let invalid = || CodecError::InvalidPayload {
        event_type: event_type.to_string(),
        event_id: Some(event_id.clone()),
    };

    match event_type {
        "voicechat.audio.start" => {
            let env: TypedEnvelope<AudioStartPayload> =
                rmp_serde::from_slice(bytes).map_err(|_| invalid())?;
            Ok(ClientFrame::AudioStart {
                event_id,
                session_id,
                payload: env.payload,
            })
        }
        "voicechat.audio.chunk" => {
            let env: TypedEnvelope<AudioChunkPayload> =
                rmp_serde::from_slice(bytes).map_err(|_| invalid())?;
            Ok(ClientFrame::AudioChunk {
                event_id,
                session_id,
                payload: env.payload,
            })
        }
        "voicechat.audio.end" => {
            let env: TypedEnvelope<AudioEndPayload> =
                rmp_serde::from_slice(bytes).map_err(|_| invalid())?;
            Ok(ClientFrame::AudioEnd {
                event_id,
                session_id,
                payload: env.payload,
            })
        }
        other => Err(CodecError::InvalidPayload {
            event_type: other.to_string(),
            event_id: Some(event_id),
        }),
    }
}
