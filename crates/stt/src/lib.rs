//! STT Engine: streaming speech-to-text provider sessions (spec.md §4.E).
//!
//! One capability trait ([`SttProvider`]/[`SttStream`]), two
//! implementations — [`EchoSttProvider`] for tests and local
//! development, [`WsSttProvider`] for the real networked provider — so
//! the Orchestrator never branches on which one it was handed. Above
//! both sits [`SttSession`], which owns the connect/reconnect retry
//! schedules and the running transcript assembly.

mod backoff;
mod echo;
mod error;
mod provider;
mod session;
mod transcript;
mod ws;

pub use backoff::{delay_for_attempt, CONNECT_BACKOFF_MS, RECONNECT_BACKOFF_MS};
pub use echo::EchoSttProvider;
pub use error::{SttError, SttFailureKind};
pub use provider::{SttConfig, SttEvent, SttProvider, SttStream};
pub use session::SttSession;
pub use transcript::{TranscriptAssembler, MAX_TRANSCRIPT_CHARS};
pub use ws::{WsSttConfig, WsSttProvider};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn session_drives_echo_provider_end_to_end() {
        let provider: Arc<dyn SttProvider> = Arc::new(EchoSttProvider::new());
        let mut session = SttSession::new(
            provider,
            SttConfig {
                sample_rate_hz: 16_000,
                language: None,
            },
        );

        session.connect().await.expect("connect");
        session.send_audio(&[0u8; 640]).await.expect("send audio");
        session.finish().await.expect("finish");

        let mut saw_final = false;
        while let Some(event) = session.next_event().await {
            if let Ok(SttEvent::Final(_)) = event {
                saw_final = true;
                break;
            }
        }
        assert!(saw_final);
        assert_eq!(session.transcript(), "echo: 640 bytes");
    }
}
