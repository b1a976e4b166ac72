use std::borrow::Cow;

use voicegate_core::audio::{SampleRate, TARGET_SAMPLE_RATE};
use voicegate_core::SessionId;

/// A stateless linear-interpolation resampler between two fixed rates.
///
/// Constructing one bounds-checks both rates against
/// [`voicegate_core::audio::MIN_SAMPLE_RATE`]/[`voicegate_core::audio::MAX_SAMPLE_RATE`];
/// out-of-range rates degrade gracefully to the nearest in-range rate
/// rather than rejecting the stream outright, since a slightly-wrong
/// pitch is preferable to dropping an in-progress utterance.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    src_hz: u32,
    dst_hz: u32,
}

impl Resampler {
    pub fn new(src_hz: u32, dst_hz: u32) -> Self {
        let src = SampleRate::parse(src_hz).unwrap_or_else(|| SampleRate::new_unchecked(clamp_hz(src_hz)));
        let dst = SampleRate::parse(dst_hz).unwrap_or_else(|| SampleRate::new_unchecked(clamp_hz(dst_hz)));
        Self {
            src_hz: src.hz(),
            dst_hz: dst.hz(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.src_hz == self.dst_hz
    }

    /// Resample a slice of PCM16 samples from `src_hz` to `dst_hz`.
    ///
    /// At identity rate this is a pass-through copy. Otherwise each output
    /// sample is a linear interpolation between its two nearest input
    /// samples, with results clamped to the `i16` range.
    pub fn process(&self, samples: &[i16]) -> Vec<i16> {
        resample(samples, self.src_hz, self.dst_hz)
    }
}

/// The Gateway-facing boundary API from spec.md §4.B:
/// `resample(sessionId, pcm16Bytes, srcRate) -> pcm16Bytes`.
///
/// `session_id` carries no behavior of its own — it only appears in the
/// log line emitted for an out-of-range `src_rate`, so a degraded
/// session can be traced back to its audio. Returns a borrowed `Cow`
/// for every passthrough case (empty input, out-of-range rate, already
/// at the target rate) so the common case costs nothing; only a true
/// rate conversion allocates.
pub fn resample_pcm16(session_id: SessionId, pcm16: &[u8], src_rate: u32) -> Cow<'_, [u8]> {
    resample_pcm16_to(session_id, pcm16, src_rate, TARGET_SAMPLE_RATE)
}

/// General form of [`resample_pcm16`] for an arbitrary destination rate:
/// outbound TTS audio is generated at the provider's own rate and must
/// be resampled up (or down) to whatever the client declared in
/// `audio.start`, not the fixed inbound target.
pub fn resample_pcm16_to(session_id: SessionId, pcm16: &[u8], src_rate: u32, dst_rate: u32) -> Cow<'_, [u8]> {
    if pcm16.is_empty() {
        return Cow::Borrowed(pcm16);
    }

    let Some(src) = SampleRate::parse(src_rate) else {
        tracing::error!(%session_id, src_rate, "resample: source rate out of range, passing audio through unchanged");
        return Cow::Borrowed(pcm16);
    };
    let dst = SampleRate::parse(dst_rate).unwrap_or(src);

    if src.hz() == dst.hz() {
        return Cow::Borrowed(pcm16);
    }

    let samples: Vec<i16> = pcm16
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    let resampled = resample(&samples, src.hz(), dst.hz());

    let mut bytes = Vec::with_capacity(resampled.len() * 2);
    for sample in resampled {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    Cow::Owned(bytes)
}

fn clamp_hz(hz: u32) -> u32 {
    hz.clamp(
        voicegate_core::audio::MIN_SAMPLE_RATE,
        voicegate_core::audio::MAX_SAMPLE_RATE,
    )
}

/// Free-function form of [`Resampler::process`], for callers that don't
/// need to hold onto the resampler between chunks.
pub fn resample(samples: &[i16], src_hz: u32, dst_hz: u32) -> Vec<i16> {
    if samples.is_empty() || src_hz == dst_hz {
        return samples.to_vec();
    }

    let src_hz = clamp_hz(src_hz);
    let dst_hz = clamp_hz(dst_hz);
    if src_hz == dst_hz {
        return samples.to_vec();
    }

    let ratio = dst_hz as f64 / src_hz as f64;
    let out_len = ((samples.len() as f64) * ratio).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(out_len);

    let step = src_hz as f64 / dst_hz as f64;
    for i in 0..out_len {
        let src_pos = i as f64 * step;
        let idx0 = src_pos.floor() as usize;
        let frac = src_pos - idx0 as f64;

        let s0 = samples[idx0.min(samples.len() - 1)] as f64;
        let s1 = samples[(idx0 + 1).min(samples.len() - 1)] as f64;
        let interpolated = s0 + (s1 - s0) * frac;
        out.push(interpolated.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    }

    out
}
