//! Outbound (server → client) frames, spec.md §6.

use serde::Serialize;
use serde_bytes::ByteBuf;
use voicegate_core::ErrorCode;

/// A frame the Gateway writes back onto the channel. `encode` turns this
/// into the wire envelope `{eventType, eventId, sessionId, payload}`.
#[derive(Debug)]
pub enum ServerFrame {
    /// Response to the very first frame on a new channel. `session_id` is
    /// the only envelope field ever populated by the server rather than
    /// echoed from the client, since the client has no session yet to send.
    ConnectionAck { session_id: String },

    /// Acknowledges a client frame by echoing `<requestEventType>.ack`.
    Ack { request_event_type: String },

    ResponseStart {
        utterance_id: String,
    },
    ResponseChunk {
        utterance_id: String,
        audio: Vec<u8>,
        sample_rate: u32,
    },
    ResponseComplete {
        utterance_id: String,
    },
    ResponseInterrupt {
        utterance_id: String,
    },

    Error {
        code: ErrorCode,
        message: String,
        request_type: String,
    },
}

impl ServerFrame {
    pub fn event_type(&self) -> String {
        match self {
            Self::ConnectionAck { .. } => "voicechat.connection.ack".to_string(),
            Self::Ack {
                request_event_type, ..
            } => format!("{request_event_type}.ack"),
            Self::ResponseStart { .. } => "voicechat.response.start".to_string(),
            Self::ResponseChunk { .. } => "voicechat.response.chunk".to_string(),
            Self::ResponseComplete { .. } => "voicechat.response.complete".to_string(),
            Self::ResponseInterrupt { .. } => "voicechat.response.interrupt".to_string(),
            Self::Error { .. } => "voicechat.error".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionAckPayload<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseStartPayload<'a> {
    pub utterance_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseChunkPayload<'a> {
    pub utterance_id: &'a str,
    pub audio: ByteBuf,
    pub sample_rate: u32,
}

impl<'a> ResponseChunkPayload<'a> {
    pub fn new(utterance_id: &'a str, audio: Vec<u8>, sample_rate: u32) -> Self {
        Self {
            utterance_id,
            audio: ByteBuf::from(audio),
            sample_rate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseCompletePayload<'a> {
    pub utterance_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseInterruptPayload<'a> {
    pub utterance_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorPayload<'a> {
    pub message: &'a str,
    pub request_type: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AckPayload {}
