//! Orchestrator: the per-session control flow tying STT, LLM, and TTS
//! together behind one channel (spec.md §4.H).

mod error;
mod handles;
mod turn;

pub mod fakes;

pub use error::OrchestratorError;
pub use handles::real::{RealLlmHandle, RealSttHandle, RealTtsHandle};
pub use handles::{LlmHandle, SttHandle, TtsChunkOut, TtsHandle};
pub use turn::{OrchestratorEvent, Turn};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeLlmHandle, FakeSttHandle, FakeTtsHandle};

    fn turn_with_fakes(reply: &str) -> Turn {
        Turn::new(
            Box::new(FakeSttHandle::new()),
            Box::new(FakeTtsHandle::new()),
            Box::new(FakeLlmHandle::new(reply)),
        )
    }

    #[tokio::test]
    async fn happy_path_acks_streams_and_completes() {
        let mut turn = turn_with_fakes("hi there");

        let start_events = turn.on_audio_start().await;
        assert!(matches!(start_events[0], OrchestratorEvent::Ack { .. }));

        turn.on_audio_chunk(&[0u8; 320]).await;

        let end_events = turn.on_audio_end().await;
        assert!(matches!(end_events[0], OrchestratorEvent::Ack { .. }));
        assert!(end_events
            .iter()
            .any(|e| matches!(e, OrchestratorEvent::ResponseStart { .. })));
        assert!(end_events
            .iter()
            .any(|e| matches!(e, OrchestratorEvent::ResponseChunk { .. })));
        assert!(matches!(
            end_events.last().unwrap(),
            OrchestratorEvent::ResponseComplete { .. }
        ));
    }

    #[tokio::test]
    async fn empty_transcript_produces_no_response() {
        let mut turn = Turn::new(
            Box::new(FakeSttHandle::silent()),
            Box::new(FakeTtsHandle::new()),
            Box::new(FakeLlmHandle::new("should not be used")),
        );
        let events = turn.on_audio_end().await;
        assert!(matches!(events.as_slice(), [OrchestratorEvent::Ack { .. }]));
        assert!(!events
            .iter()
            .any(|e| matches!(e, OrchestratorEvent::ResponseStart { .. })));
    }

    #[tokio::test]
    async fn stt_connect_failure_surfaces_stt_error() {
        let mut turn = Turn::new(
            Box::new(FakeSttHandle::failing_connect("provider unreachable")),
            Box::new(FakeTtsHandle::new()),
            Box::new(FakeLlmHandle::new("unused")),
        );

        let events = turn.on_audio_start().await;
        match &events[0] {
            OrchestratorEvent::Error { code, .. } => {
                assert_eq!(*code, voicegate_core::ErrorCode::SttError);
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn barge_in_cancels_in_flight_response() {
        let mut turn = turn_with_fakes("a reasonably long reply to stream in chunks");
        turn.on_audio_start().await;
        turn.on_audio_chunk(&[0u8; 16]).await;
        turn.on_audio_end().await;

        // Simulate the client speaking again mid-response.
        let events = turn.on_audio_chunk(&[0u8; 16]).await;
        assert!(events
            .iter()
            .any(|e| matches!(e, OrchestratorEvent::ResponseInterrupt { .. })));
    }
}
