use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use voicegate_core::{ConnectionId, SessionId};

/// The session lifecycle (spec.md §3). Transitions only ever move
/// forward: `Idle -> Active -> Ended`. There is no resurrection of an
/// ended session; a client that reconnects gets a new `SessionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Ended,
}

/// The connection-supplied facts about a session (spec.md §3): the
/// client's declared audio rate and requested voice/language, plus
/// where the connection came from. Captured once at `audio.start` and
/// persisted on activation (spec.md §4.H step 4) rather than living
/// only in the Gateway's transient per-socket state.
#[derive(Debug, Clone, Default)]
pub struct SessionMetadata {
    pub sampling_rate: Option<u32>,
    pub voice_id: Option<String>,
    pub language: Option<String>,
    pub remote_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A live session and the engine-attachment flags the Orchestrator
/// flips as it wires STT/LLM/TTS handles in for the first `audio.start`.
pub struct Session {
    pub id: SessionId,
    connection_id: RwLock<ConnectionId>,
    state: RwLock<SessionState>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
    stt_attached: AtomicBool,
    tts_attached: AtomicBool,
    llm_attached: AtomicBool,
    metadata: RwLock<SessionMetadata>,
}

impl Session {
    pub fn new(id: SessionId, connection_id: ConnectionId) -> Self {
        Self::with_metadata(id, connection_id, SessionMetadata::default())
    }

    pub fn with_metadata(id: SessionId, connection_id: ConnectionId, metadata: SessionMetadata) -> Self {
        Self {
            id,
            connection_id: RwLock::new(connection_id),
            state: RwLock::new(SessionState::Idle),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            stt_attached: AtomicBool::new(false),
            tts_attached: AtomicBool::new(false),
            llm_attached: AtomicBool::new(false),
            metadata: RwLock::new(metadata),
        }
    }

    pub fn metadata(&self) -> SessionMetadata {
        self.metadata.read().clone()
    }

    /// Persist the client-declared facts captured from `audio.start`,
    /// spec.md §4.H step 4.
    pub fn set_metadata(&self, sampling_rate: Option<u32>, voice_id: Option<String>, language: Option<String>) {
        let mut metadata = self.metadata.write();
        metadata.sampling_rate = sampling_rate;
        metadata.voice_id = voice_id;
        metadata.language = language;
    }

    /// Persist where the channel came from, captured once at connection
    /// accept time.
    pub fn set_connection_info(&self, remote_address: Option<String>, user_agent: Option<String>) {
        let mut metadata = self.metadata.write();
        metadata.remote_address = remote_address;
        metadata.user_agent = user_agent;
    }

    pub fn connection_id(&self) -> ConnectionId {
        *self.connection_id.read()
    }

    /// Rebind this session onto a new connection, e.g. a reconnecting
    /// client resuming its session id within the grace window.
    pub fn rebind_connection(&self, connection_id: ConnectionId) {
        *self.connection_id.write() = connection_id;
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn activate(&self) {
        let mut state = self.state.write();
        if *state == SessionState::Idle {
            *state = SessionState::Active;
        }
    }

    pub fn end(&self) {
        *self.state.write() = SessionState::Ended;
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_activity.read().elapsed()
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn mark_stt_attached(&self) {
        self.stt_attached.store(true, Ordering::Relaxed);
    }

    pub fn mark_tts_attached(&self) {
        self.tts_attached.store(true, Ordering::Relaxed);
    }

    pub fn mark_llm_attached(&self) {
        self.llm_attached.store(true, Ordering::Relaxed);
    }

    pub fn stt_attached(&self) -> bool {
        self.stt_attached.load(Ordering::Relaxed)
    }

    pub fn tts_attached(&self) -> bool {
        self.tts_attached.load(Ordering::Relaxed)
    }

    pub fn llm_attached(&self) -> bool {
        self.llm_attached.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_advances_forward_only() {
        let s = Session::new(SessionId::new(), ConnectionId::new());
        assert_eq!(s.state(), SessionState::Idle);
        s.activate();
        assert_eq!(s.state(), SessionState::Active);
        s.end();
        assert_eq!(s.state(), SessionState::Ended);
        // Ending is terminal: activating again is a no-op since the
        // idle->active guard only fires from Idle.
        s.activate();
        assert_eq!(s.state(), SessionState::Ended);
    }

    #[test]
    fn set_metadata_persists_client_declared_facts() {
        let s = Session::new(SessionId::new(), ConnectionId::new());
        assert!(s.metadata().sampling_rate.is_none());

        s.set_metadata(Some(24_000), Some("voice-1".to_string()), Some("en-US".to_string()));
        let metadata = s.metadata();
        assert_eq!(metadata.sampling_rate, Some(24_000));
        assert_eq!(metadata.voice_id.as_deref(), Some("voice-1"));
        assert_eq!(metadata.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn attachment_flags_are_independent() {
        let s = Session::new(SessionId::new(), ConnectionId::new());
        assert!(!s.stt_attached());
        s.mark_stt_attached();
        assert!(s.stt_attached());
        assert!(!s.tts_attached());
        assert!(!s.llm_attached());
    }
}
