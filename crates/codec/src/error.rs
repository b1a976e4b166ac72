//! Codec failure modes.
//!
//! Every decode failure ultimately surfaces to the client as an
//! `invalidPayload` frame (spec.md §4.A, §7); this enum exists so the
//! Gateway can tell the two flavors of that apart:
//! - the envelope itself could not be parsed at all ([`CodecError::Malformed`])
//! - the envelope parsed but `eventType`/`eventId`/`sessionId` were not
//!   strings, or a known event type's payload didn't match its shape
//!   ([`CodecError::InvalidPayload`])

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Not even a well-formed MessagePack map — no `eventType` could be
    /// extracted. Per spec.md §4.A this is reported against the synthetic
    /// event type `"error.unknown"`.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The envelope parsed, but `eventType`/`eventId`/`sessionId` failed the
    /// string-type check, or a recognized event type's payload did not
    /// decode into its expected shape.
    #[error("invalid payload for {event_type}")]
    InvalidPayload {
        event_type: String,
        event_id: Option<String>,
    },

    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

impl CodecError {
    pub fn event_type(&self) -> &str {
        match self {
            Self::Malformed(_) => "error.unknown",
            Self::InvalidPayload { event_type, .. } => event_type,
            Self::EncodeFailed(_) => "error.unknown",
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::InvalidPayload { event_id, .. } => event_id.as_deref(),
            _ => None,
        }
    }
}
