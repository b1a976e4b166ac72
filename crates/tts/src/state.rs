/// The TTS session lifecycle (spec.md §3).
///
/// ```text
///        ┌──────────────────────────────────────────────┐
///        ▼                                               │
/// Idle ──────▶ Generating ──────▶ Streaming ──────▶ Completed
///   ▲              │                   │                 │
///   │              ▼                   ▼                 │
///   │            Error               Error                │
///   │              │                   │                  │
///   │              ▼                   ▼                  │
///   └──────────  (session ends)   Cancelled ◀──────────────
/// ```
///
/// `Cancelled` is reachable only from `Streaming` (an interruption mid
/// playback); `Error` is reachable from either working state. Both are
/// terminal for the utterance — the next utterance starts a fresh
/// state machine back at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsState {
    Idle,
    Generating,
    Streaming,
    Completed,
    Cancelled,
    Error,
}

impl TtsState {
    /// Whether `to` is a legal transition from `self`.
    pub fn can_transition_to(&self, to: TtsState) -> bool {
        use TtsState::*;
        matches!(
            (*self, to),
            (Idle, Generating)
                | (Generating, Streaming)
                | (Generating, Error)
                | (Streaming, Completed)
                | (Streaming, Cancelled)
                | (Streaming, Error)
                | (Completed, Idle)
                | (Cancelled, Idle)
                | (Error, Idle)
        )
    }
}
