use uuid::Uuid;
use voicegate_core::ErrorCode;

use crate::error::OrchestratorError;
use crate::handles::{LlmHandle, SttHandle, TtsHandle};

/// An outcome the Gateway turns into a wire frame. Kept independent of
/// `voicegate-codec` so the Orchestrator's control flow can be tested
/// without pulling in the codec crate's envelope types.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    Ack {
        request_event_type: &'static str,
    },
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

/// Drives one session's turn-taking: `audio.start` opens an utterance,
/// `audio.chunk` feeds STT (and interrupts an in-flight response if the
/// client starts speaking again), `audio.end` closes recognition and
/// runs the recognized text through the LLM and TTS engines.
pub struct Turn {
    stt: Box<dyn SttHandle>,
    tts: Box<dyn TtsHandle>,
    llm: Box<dyn LlmHandle>,
    current_utterance_id: Option<String>,
    tts_streaming: bool,
    /// Set once `next_tts_event` has handed out the last audio chunk of
    /// an utterance but still owes the caller a terminal
    /// `response.complete` on the following poll.
    pending_complete: bool,
}

impl Turn {
    pub fn new(stt: Box<dyn SttHandle>, tts: Box<dyn TtsHandle>, llm: Box<dyn LlmHandle>) -> Self {
        Self {
            stt,
            tts,
            llm,
            current_utterance_id: None,
            tts_streaming: false,
            pending_complete: false,
        }
    }

    pub async fn on_audio_start(&mut self) -> Vec<OrchestratorEvent> {
        let mut events: Vec<OrchestratorEvent> = self.interrupt_if_streaming().into_iter().collect();
        match self.stt.connect().await {
            Ok(()) => events.push(OrchestratorEvent::Ack {
                request_event_type: "voicechat.audio.start",
            }),
            Err(e) => events.push(error_event(e, "voicechat.audio.start")),
        }
        events
    }

    /// Cancel an in-flight response and emit its `response.interrupt`,
    /// if one is currently streaming. Shared by an explicit new
    /// `audio.start` (spec.md §4.H "Interruption") and by barge-in
    /// detected on the next `audio.chunk`.
    fn interrupt_if_streaming(&mut self) -> Option<OrchestratorEvent> {
        if !self.tts_streaming {
            return None;
        }
        self.tts.cancel();
        self.tts.reset();
        self.tts_streaming = false;
        self.pending_complete = false;
        self.current_utterance_id
            .take()
            .map(|utterance_id| OrchestratorEvent::ResponseInterrupt { utterance_id })
    }

    /// Feed a chunk of inbound PCM16LE audio. If a response is
    /// currently streaming out, the client speaking again is treated as
    /// a barge-in: the in-flight TTS is cancelled and a
    /// `response.interrupt` is emitted before the audio is handed to
    /// STT.
    pub async fn on_audio_chunk(&mut self, pcm16le: &[u8]) -> Vec<OrchestratorEvent> {
        let mut events: Vec<OrchestratorEvent> = self.interrupt_if_streaming().into_iter().collect();

        if let Err(e) = self.stt.send_audio(pcm16le).await {
            events.push(error_event(e, "voicechat.audio.chunk"));
        }

        events
    }

    /// Whether a response is still being streamed out (including an
    /// already-finished stream still owing a terminal
    /// `response.complete`). Callers driving [`Turn::next_tts_event`]
    /// in a loop should keep polling while this is true rather than
    /// stopping on the first `None`, since a provider chunk with no
    /// payload yields `None` without ending the utterance.
    pub fn is_response_active(&self) -> bool {
        self.tts_streaming || self.pending_complete
    }

    /// End of speech: finish STT, run the LLM, and kick off the TTS
    /// response. Only `response.start` is emitted here — the caller
    /// drains the rest with repeated [`Turn::next_tts_event`] calls,
    /// interleaved with [`Turn::on_audio_chunk`], so a barge-in mid
    /// response is observable between chunks rather than only after
    /// the whole utterance has already been synthesized.
    pub async fn on_audio_end(&mut self) -> Vec<OrchestratorEvent> {
        let mut events = vec![OrchestratorEvent::Ack {
            request_event_type: "voicechat.audio.end",
        }];

        let transcript = match self.stt.finish().await {
            Ok(text) => text,
            Err(e) => {
                events.push(error_event(e, "voicechat.audio.end"));
                return events;
            }
        };

        if transcript.trim().is_empty() {
            return events;
        }

        let reply = self.llm.respond(&transcript).await;

        let utterance_id = Uuid::new_v4().to_string();

        if let Err(e) = self.tts.start(&reply.text).await {
            events.push(error_event(e, "voicechat.audio.end"));
            return events;
        }

        self.current_utterance_id = Some(utterance_id.clone());
        self.tts_streaming = true;
        events.push(OrchestratorEvent::ResponseStart { utterance_id });

        events
    }

    /// Ping the TTS provider to keep its connection alive while no
    /// utterance is in flight. A no-op while actively streaming, since
    /// the chunk traffic itself keeps the connection warm.
    pub async fn keepalive_tts(&mut self) {
        if !self.tts_streaming {
            let _ = self.tts.keepalive().await;
        }
    }

    /// Pull the next piece of the in-flight TTS response, if any.
    /// Returns `None` once there is nothing currently streaming —
    /// either the utterance finished, was interrupted, or none is
    /// in flight.
    pub async fn next_tts_event(&mut self) -> Option<OrchestratorEvent> {
        if self.pending_complete {
            self.pending_complete = false;
            let utterance_id = self.current_utterance_id.take()?;
            return Some(OrchestratorEvent::ResponseComplete { utterance_id });
        }
        if !self.tts_streaming {
            return None;
        }
        let utterance_id = self.current_utterance_id.clone()?;

        match self.tts.next_chunk().await {
            Ok(Some(chunk)) => {
                if chunk.is_final {
                    self.tts_streaming = false;
                    if chunk.audio.is_empty() {
                        self.current_utterance_id = None;
                        return Some(OrchestratorEvent::ResponseComplete { utterance_id });
                    }
                    // The provider folded its last audio into the same
                    // message as completion: emit the chunk now and
                    // queue the terminal `response.complete` for the
                    // caller's next poll rather than dropping it.
                    self.pending_complete = true;
                    return Some(OrchestratorEvent::ResponseChunk {
                        utterance_id,
                        audio: chunk.audio,
                        sample_rate: chunk.sample_rate,
                    });
                }
                if chunk.audio.is_empty() {
                    return None;
                }
                Some(OrchestratorEvent::ResponseChunk {
                    utterance_id,
                    audio: chunk.audio,
                    sample_rate: chunk.sample_rate,
                })
            }
            Ok(None) => {
                self.tts_streaming = false;
                self.current_utterance_id = None;
                Some(OrchestratorEvent::ResponseComplete { utterance_id })
            }
            Err(e) => {
                self.tts_streaming = false;
                self.current_utterance_id = None;
                Some(error_event(e, "voicechat.response"))
            }
        }
    }
}

fn error_event(err: OrchestratorError, request_type: &str) -> OrchestratorEvent {
    OrchestratorEvent::Error {
        code: err.code(),
        message: err.to_string(),
        request_type: request_type.to_string(),
    }
}
