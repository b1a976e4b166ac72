use std::sync::Arc;

use dashmap::DashMap;
use voicegate_core::{Message, SessionId};

use crate::context::LlmContext;
use crate::fallback::fallback_for_attempt;
use crate::provider::{GenerationResult, LlmProvider};

/// Wraps a [`LlmProvider`] with the per-session conversation history
/// and the tiered fallback ladder: consecutive provider failures for a
/// session escalate through the fallback tiers rather than repeating
/// the same canned response forever.
pub struct LlmEngine {
    provider: Arc<dyn LlmProvider>,
    context: Arc<LlmContext>,
    consecutive_failures: DashMap<SessionId, u32>,
}

impl LlmEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, context: Arc<LlmContext>) -> Self {
        Self {
            provider,
            context,
            consecutive_failures: DashMap::new(),
        }
    }

    /// Seed a brand-new session's context with the system prompt
    /// (spec.md §4.G: `initialize` "creates a conversation context
    /// seeded with the system prompt"; spec.md §3: "first message is
    /// always the system prompt"). A no-op if the session already has
    /// history, so a reconnecting caller can't duplicate the prompt.
    pub fn initialize(&self, session_id: SessionId, system_prompt: impl Into<String>) {
        if self.context.history(session_id).is_empty() {
            self.context.push(session_id, Message::system(system_prompt));
        }
    }

    /// Generate a reply to `user_text` for `session_id`, appending both
    /// the user turn and the assistant reply to the session's history.
    /// Provider failures fall back to the tiered canned ladder instead
    /// of propagating an error up to the Orchestrator.
    pub async fn respond(&self, session_id: SessionId, user_text: &str) -> GenerationResult {
        self.context.push(session_id, Message::user(user_text));
        let history = self.context.history(session_id);

        match self.provider.generate(&history).await {
            Ok(result) => {
                self.consecutive_failures.remove(&session_id);
                self.context
                    .push(session_id, Message::assistant(result.text.clone()));
                result
            }
            Err(e) => {
                let mut failures = self.consecutive_failures.entry(session_id).or_insert(0);
                *failures += 1;
                let fatal = !e.is_retryable();
                tracing::warn!(error = %e, attempt = *failures, fatal, "LLM generation failed, using fallback");
                let result = fallback_for_attempt(*failures, fatal);
                self.context
                    .push(session_id, Message::assistant(result.text.clone()));
                result
            }
        }
    }

    pub fn clear_session(&self, session_id: SessionId) {
        self.context.clear(session_id);
        self.consecutive_failures.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysFails;

    #[async_trait]
    impl LlmProvider for AlwaysFails {
        async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
            Err(LlmError::Network("boom".to_string()))
        }
    }

    struct AlwaysFailsFatally;

    #[async_trait]
    impl LlmProvider for AlwaysFailsFatally {
        async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
            Err(LlmError::Configuration("bad api key".to_string()))
        }
    }

    #[tokio::test]
    async fn escalates_fallback_tier_on_repeated_failure() {
        let context = Arc::new(LlmContext::new(50, Duration::from_secs(3600)));
        let engine = LlmEngine::new(Arc::new(AlwaysFails), context);
        let session = SessionId::new();

        let first = engine.respond(session, "hi").await;
        assert_eq!(first.tier, Some(1));
        let second = engine.respond(session, "hi again").await;
        assert_eq!(second.tier, Some(2));
        let third = engine.respond(session, "still broken").await;
        assert_eq!(third.tier, Some(3));
    }

    #[tokio::test]
    async fn a_fatal_failure_skips_tier_one_on_the_first_attempt() {
        let context = Arc::new(LlmContext::new(50, Duration::from_secs(3600)));
        let engine = LlmEngine::new(Arc::new(AlwaysFailsFatally), context);
        let session = SessionId::new();

        let first = engine.respond(session, "hi").await;
        assert_eq!(first.tier, Some(2));
    }

    #[tokio::test]
    async fn initialize_seeds_the_system_prompt_once() {
        let context = Arc::new(LlmContext::new(50, Duration::from_secs(3600)));
        let engine = LlmEngine::new(Arc::new(crate::echo::EchoLlmProvider::new()), context);
        let session = SessionId::new();

        engine.initialize(session, "you are a helpful voice assistant");
        engine.initialize(session, "a second prompt that should be ignored");

        let history = engine.respond(session, "hello").await;
        let _ = history;
        let messages = engine.context.history(session);
        assert_eq!(messages[0].role, voicegate_core::Role::System);
        assert_eq!(messages[0].content, "you are a helpful voice assistant");
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let context = Arc::new(LlmContext::new(50, Duration::from_secs(3600)));
        let engine = LlmEngine::new(Arc::new(crate::echo::EchoLlmProvider::new()), context);
        let session = SessionId::new();

        let result = engine.respond(session, "hello").await;
        assert!(!result.is_fallback);
        assert_eq!(engine.consecutive_failures.get(&session).is_none(), true);
    }
}
