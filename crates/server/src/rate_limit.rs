//! Per-connection inbound rate limiting.
//!
//! Grounded in the shape of the teacher's own rate limiter (a small
//! per-socket guard consulted on every inbound message and every audio
//! payload), but implemented as a fixed-window counter over
//! `std::time::Instant` rather than an external cache crate: a
//! per-connection limiter only ever sees one task's traffic, so there is
//! no concurrent-access case to justify pulling in a dependency like
//! `moka` that the rest of this workspace doesn't otherwise use.

use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_messages_per_window: u32,
    pub max_audio_bytes_per_window: u64,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages_per_window: 200,
            max_audio_bytes_per_window: 4 * 1024 * 1024,
            window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("message rate exceeded")]
    MessageRate,
    #[error("audio byte rate exceeded")]
    ByteRate,
}

/// A fixed-window limiter scoped to one connection. `check_message` and
/// `check_audio` are tracked independently so a burst of control frames
/// doesn't starve the budget audio chunks need, and vice versa.
pub struct RateLimiter {
    config: RateLimitConfig,
    window_start: Instant,
    messages_in_window: u32,
    bytes_in_window: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            window_start: Instant::now(),
            messages_in_window: 0,
            bytes_in_window: 0,
        }
    }

    fn roll_window_if_elapsed(&mut self) {
        if self.window_start.elapsed() >= self.config.window {
            self.window_start = Instant::now();
            self.messages_in_window = 0;
            self.bytes_in_window = 0;
        }
    }

    pub fn check_message(&mut self) -> Result<(), RateLimitError> {
        self.roll_window_if_elapsed();
        self.messages_in_window += 1;
        if self.messages_in_window > self.config.max_messages_per_window {
            return Err(RateLimitError::MessageRate);
        }
        Ok(())
    }

    pub fn check_audio(&mut self, bytes: usize) -> Result<(), RateLimitError> {
        self.roll_window_if_elapsed();
        self.bytes_in_window += bytes as u64;
        if self.bytes_in_window > self.config.max_audio_bytes_per_window {
            return Err(RateLimitError::ByteRate);
        }
        Ok(())
    }
}
