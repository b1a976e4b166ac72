use async_trait::async_trait;
use voicegate_core::Message;

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: std::time::Duration,
    pub max_retries: u32,
    pub initial_backoff: std::time::Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gateway-default".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            max_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            timeout: std::time::Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: std::time::Duration::from_millis(100),
        }
    }
}

/// The result of a single generation turn. `is_fallback`/`tier` are
/// explicit rather than inferred from the text, so callers never need
/// to pattern-match on canned-response wording to know whether the
/// model actually spoke (spec.md §4.G).
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub is_fallback: bool,
    pub tier: Option<u8>,
}

impl GenerationResult {
    pub fn real(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_fallback: false,
            tier: None,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;
}
