use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::watch;
use voicegate_core::{Message, Role, SessionId};

struct ContextEntry {
    messages: RwLock<Vec<Message>>,
    last_touched: RwLock<Instant>,
}

/// Per-session conversation history, capped at `max_messages` per
/// session (oldest dropped first) and reaped by a background sweep
/// after `idle_timeout` of inactivity — mirroring the session
/// registry's sweep shape but keyed on conversation turns rather than
/// connection liveness.
pub struct LlmContext {
    entries: DashMap<SessionId, ContextEntry>,
    max_messages: usize,
    idle_timeout: Duration,
}

impl LlmContext {
    pub fn new(max_messages: usize, idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_messages,
            idle_timeout,
        }
    }

    /// Append a message to a session's history, evicting the oldest
    /// entries past `max_messages`. A system prompt pinned at position
    /// 0 (spec.md §3: "first message is always the system prompt") is
    /// never evicted — only messages after it count against the cap.
    pub fn push(&self, session_id: SessionId, message: Message) {
        let entry = self.entries.entry(session_id).or_insert_with(|| ContextEntry {
            messages: RwLock::new(Vec::new()),
            last_touched: RwLock::new(Instant::now()),
        });
        let mut messages = entry.messages.write();
        messages.push(message);

        let pinned = matches!(messages.first(), Some(m) if m.role == Role::System);
        let start = if pinned { 1 } else { 0 };
        let budget = self.max_messages.saturating_sub(start);
        if messages.len() > start + budget {
            let overflow = messages.len() - start - budget;
            messages.drain(start..start + overflow);
        }

        *entry.last_touched.write() = Instant::now();
    }

    pub fn history(&self, session_id: SessionId) -> Vec<Message> {
        self.entries
            .get(&session_id)
            .map(|entry| entry.messages.read().clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: SessionId) {
        self.entries.remove(&session_id);
    }

    fn sweep(&self) -> usize {
        let expired: Vec<SessionId> = self
            .entries
            .iter()
            .filter(|entry| entry.value().last_touched.read().elapsed() > self.idle_timeout)
            .map(|entry| *entry.key())
            .collect();
        let count = expired.len();
        for session_id in expired {
            self.entries.remove(&session_id);
        }
        count
    }

    pub fn start_sweep_task(self: &Arc<Self>, interval: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let context = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reaped = context.sweep();
                        if reaped > 0 {
                            tracing::debug!(reaped, "LLM context sweep evicted idle conversations");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_history_at_max_messages() {
        let ctx = LlmContext::new(2, Duration::from_secs(60));
        let session = SessionId::new();
        ctx.push(session, Message::user("one"));
        ctx.push(session, Message::user("two"));
        ctx.push(session, Message::user("three"));

        let history = ctx.history(session);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "two");
        assert_eq!(history[1].content, "three");
    }

    #[test]
    fn pinned_system_message_survives_overflow_eviction() {
        let ctx = LlmContext::new(2, Duration::from_secs(60));
        let session = SessionId::new();
        ctx.push(session, Message::system("you are a helpful assistant"));
        ctx.push(session, Message::user("one"));
        ctx.push(session, Message::user("two"));
        ctx.push(session, Message::user("three"));

        let history = ctx.history(session);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, voicegate_core::Role::System);
        assert_eq!(history[1].content, "three");
    }

    #[test]
    fn sweep_reaps_idle_sessions() {
        let ctx = LlmContext::new(10, Duration::from_millis(0));
        let session = SessionId::new();
        ctx.push(session, Message::user("hi"));
        std::thread::sleep(Duration::from_millis(5));
        let reaped = ctx.sweep();
        assert_eq!(reaped, 1);
        assert!(ctx.history(session).is_empty());
    }
}
