/// Assembles the running transcript for a session's current utterance,
/// enforcing the hard cap on accumulated transcript size so a
/// pathologically long stream can't grow this without bound.
pub const MAX_TRANSCRIPT_CHARS: usize = 50_000;

#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    buf: String,
    truncated: bool,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of recognized text, truncating at
    /// [`MAX_TRANSCRIPT_CHARS`] if the cap is reached. Once truncated,
    /// further appends are silently dropped for the remainder of the
    /// utterance.
    pub fn push(&mut self, text: &str) {
        if self.truncated {
            return;
        }
        let remaining = MAX_TRANSCRIPT_CHARS.saturating_sub(self.buf.chars().count());
        if remaining == 0 {
            self.truncated = true;
            return;
        }
        let to_take: String = text.chars().take(remaining).collect();
        if to_take.chars().count() < text.chars().count() {
            self.truncated = true;
        }
        self.buf.push_str(&to_take);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.truncated = false;
    }
}
