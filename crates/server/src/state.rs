//! Shared application state handed to every HTTP and WebSocket handler,
//! mirroring the teacher's `AppState` (constructed once in `main.rs`,
//! cloned cheaply per request since every field is an `Arc`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use voicegate_config::Settings;
use voicegate_llm::LlmEngine;
use voicegate_session::SessionRegistry;
use voicegate_stt::SttProvider;
use voicegate_tts::TtsProvider;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub session_registry: Arc<SessionRegistry>,
    pub stt_provider: Arc<dyn SttProvider>,
    pub tts_provider: Arc<dyn TtsProvider>,
    pub llm_engine: Arc<LlmEngine>,
    pub started_at: Instant,
    pub total_connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        session_registry: Arc<SessionRegistry>,
        stt_provider: Arc<dyn SttProvider>,
        tts_provider: Arc<dyn TtsProvider>,
        llm_engine: Arc<LlmEngine>,
    ) -> Self {
        Self {
            settings,
            session_registry,
            stt_provider,
            tts_provider,
            llm_engine,
            started_at: Instant::now(),
            total_connections: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn note_new_connection(&self) -> u64 {
        self.total_connections.fetch_add(1, Ordering::Relaxed) + 1
    }
}
