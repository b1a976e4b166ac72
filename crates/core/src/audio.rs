//! Audio domain types shared by the resampler, STT, and TTS engines.

use serde::{Deserialize, Serialize};

/// The only rate the STT provider and the internal pipeline accept.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Inclusive bounds on a client-declared sampling rate (spec.md §4.B).
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 48_000;

/// A validated sample rate in the accepted range.
///
/// `SampleRate::parse` is the single gate used by both the Gateway's
/// `audio.start` validation and the Resampler's boundary check, so the two
/// can never disagree about what is in-range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleRate(u32);

impl SampleRate {
    pub fn parse(hz: u32) -> Option<Self> {
        if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&hz) {
            Some(Self(hz))
        } else {
            None
        }
    }

    /// Construct without bounds checking; used for the resampler's
    /// graceful-degradation path where an out-of-range rate still needs a
    /// value to log and passthrough.
    pub fn new_unchecked(hz: u32) -> Self {
        Self(hz)
    }

    pub fn hz(&self) -> u32 {
        self.0
    }

    pub fn is_target(&self) -> bool {
        self.0 == TARGET_SAMPLE_RATE
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self(TARGET_SAMPLE_RATE)
    }
}

/// Wire-level audio encoding. The gateway only ever carries signed 16-bit
/// little-endian PCM; this exists so TTS provider configs have somewhere to
/// say so explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioEncoding {
    Pcm16Le,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self::Pcm16Le
    }
}
