//! Shared types for the voice conversation gateway
//!
//! This crate provides the foundational types used across every other
//! crate in the workspace: session/connection identifiers, the audio
//! sample-rate domain, the LLM message shape, and the wire-facing error
//! taxonomy from the external interface.

pub mod audio;
pub mod error;
pub mod ids;
pub mod llm;

pub use audio::{AudioEncoding, SampleRate};
pub use error::ErrorCode;
pub use ids::{ConnectionId, SessionId};
pub use llm::{Message, Role};
