//! Sample-rate conversion between whatever rate a provider speaks and the
//! gateway's internal target rate (spec.md §4.B).
//!
//! The resampler is stateless linear interpolation — good enough for
//! speech-grade PCM16 and cheap enough to run per-chunk with no buffering
//! across calls. It is deliberately not a full polyphase/sinc resampler;
//! that tradeoff is recorded as an open question in the workspace-level
//! design notes.

mod resampler;

pub use resampler::{resample, resample_pcm16, resample_pcm16_to, Resampler};
