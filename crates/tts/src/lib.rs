//! TTS Engine: streaming text-to-speech provider sessions (spec.md §4.F).
//!
//! [`TtsSession`] owns the state machine, keepalive cadence, and
//! reconnection buffering around a provider-agnostic [`TtsProvider`];
//! [`EchoTtsProvider`] and [`WsTtsProvider`] are its two
//! implementations.

mod buffer;
mod echo;
mod error;
mod provider;
mod session;
mod state;
mod ws;

pub use buffer::{ReconnectBuffer, KEEPALIVE_INTERVAL, RECONNECT_BACKOFF_MS};
pub use echo::EchoTtsProvider;
pub use error::{TtsError, TtsFailureKind};
pub use provider::{prepare_text, TtsChunk, TtsConfig, TtsProvider, TtsStream, MAX_TEXT_CHARS};
pub use session::TtsSession;
pub use state::TtsState;
pub use ws::{WsTtsConfig, WsTtsProvider};
