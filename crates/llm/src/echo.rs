use async_trait::async_trait;
use voicegate_core::{Message, Role};

use crate::error::LlmError;
use crate::provider::{GenerationResult, LlmProvider};

/// A loopback LLM provider: responds by echoing the most recent user
/// message back, prefixed so it's obviously not a real model answer.
/// Used for tests and local development in place of a live provider
/// credential, matching the STT/TTS engines' echo/loopback pattern.
#[derive(Debug, Default)]
pub struct EchoLlmProvider;

impl EchoLlmProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for EchoLlmProvider {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(GenerationResult::real(format!("echo: {last_user}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_last_user_message() {
        let provider = EchoLlmProvider::new();
        let messages = vec![
            Message::system("you are a test"),
            Message::user("hello there"),
        ];
        let result = provider.generate(&messages).await.unwrap();
        assert_eq!(result.text, "echo: hello there");
        assert!(!result.is_fallback);
    }
}
