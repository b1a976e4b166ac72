use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::watch;
use voicegate_core::{ConnectionId, SessionId};

use crate::session::{Session, SessionMetadata};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no session registered for connection")]
    UnknownConnection,
    #[error("unknown session id")]
    UnknownSession,
}

/// Tracks every live session plus the connection it currently rides on.
///
/// Two independent concurrent maps rather than one map guarded by a
/// lock: `by_connection` answers "what session is this socket talking
/// for" on every inbound frame, `by_session` answers "give me the
/// session state" everywhere else. Both point at the same `Arc<Session>`,
/// so there is exactly one owned copy of session state regardless of
/// which map found it.
pub struct SessionRegistry {
    by_connection: DashMap<ConnectionId, SessionId>,
    by_session: DashMap<SessionId, Arc<Session>>,
    idle_timeout: Duration,
    max_duration: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration, max_duration: Duration) -> Self {
        Self {
            by_connection: DashMap::new(),
            by_session: DashMap::new(),
            idle_timeout,
            max_duration,
        }
    }

    /// Register a session for a connection that just opened the
    /// channel. If one already exists for this connection (spec.md
    /// §4.C), that existing session is returned unchanged rather than
    /// silently replaced by a fresh `SessionId`.
    pub fn create(&self, connection_id: ConnectionId, metadata: SessionMetadata) -> Arc<Session> {
        if let Some(existing) = self.get_by_connection(connection_id) {
            return existing;
        }
        let session_id = SessionId::new();
        let session = Arc::new(Session::with_metadata(session_id, connection_id, metadata));
        self.by_connection.insert(connection_id, session_id);
        self.by_session.insert(session_id, session.clone());
        session
    }

    pub fn get_by_connection(&self, connection_id: ConnectionId) -> Option<Arc<Session>> {
        let session_id = *self.by_connection.get(&connection_id)?;
        self.by_session.get(&session_id).map(|s| s.clone())
    }

    pub fn get(&self, session_id: SessionId) -> Option<Arc<Session>> {
        self.by_session.get(&session_id).map(|s| s.clone())
    }

    /// Tear down a session and its connection mapping. Called both when
    /// a channel closes and when the periodic sweep reaps an expired
    /// session.
    pub fn remove(&self, session_id: SessionId) {
        if let Some((_, session)) = self.by_session.remove(&session_id) {
            session.end();
            self.by_connection
                .retain(|_, sid| *sid != session_id);
        }
    }

    pub fn remove_connection(&self, connection_id: ConnectionId) {
        if let Some((_, session_id)) = self.by_connection.remove(&connection_id) {
            self.remove(session_id);
        }
    }

    pub fn len(&self) -> usize {
        self.by_session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_session.is_empty()
    }

    /// Remove every session that has either been idle past
    /// `idle_timeout` or alive past `max_duration`, regardless of
    /// activity. Returns how many were reaped.
    fn sweep(&self) -> usize {
        let expired: Vec<SessionId> = self
            .by_session
            .iter()
            .filter(|entry| {
                let session = entry.value();
                session.idle_duration() > self.idle_timeout || session.age() > self.max_duration
            })
            .map(|entry| *entry.key())
            .collect();

        let count = expired.len();
        for session_id in expired {
            self.remove(session_id);
        }
        count
    }

    /// Spawn the background sweep task, mirroring the teacher's
    /// cleanup-task shape: a `tokio::time::interval` loop selecting
    /// against a `watch` shutdown signal. Returns the shutdown sender.
    pub fn start_sweep_task(self: &Arc<Self>, interval: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reaped = registry.sweep();
                        if reaped > 0 {
                            tracing::info!(reaped, remaining = registry.len(), "session sweep reaped expired sessions");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("session sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
