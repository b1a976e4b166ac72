use std::time::Duration;

/// Delay before each successive connect attempt, in order. The first
/// attempt is immediate; later attempts back off up to 5s.
pub const CONNECT_BACKOFF_MS: &[u64] = &[0, 100, 1_000, 3_000, 5_000];

/// Delay before each successive mid-stream reconnection attempt after
/// the connection drops partway through an utterance. Kept short since
/// the session has already committed to an in-progress turn.
pub const RECONNECT_BACKOFF_MS: &[u64] = &[0, 100, 500];

/// Yields the `Duration` for attempt `n` (0-indexed) in `schedule`,
/// clamping to the schedule's last entry once attempts exceed its
/// length rather than growing unboundedly.
pub fn delay_for_attempt(schedule: &[u64], attempt: usize) -> Duration {
    let ms = schedule
        .get(attempt)
        .or_else(|| schedule.last())
        .copied()
        .unwrap_or(0);
    Duration::from_millis(ms)
}
