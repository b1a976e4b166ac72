//! LLM Engine: conversational context, provider backends, and the
//! tiered fallback ladder (spec.md §4.G).

mod context;
mod echo;
mod engine;
mod error;
mod fallback;
mod http;
mod provider;

pub use context::LlmContext;
pub use echo::EchoLlmProvider;
pub use engine::LlmEngine;
pub use error::LlmError;
pub use fallback::fallback_for_attempt;
pub use http::HttpLlmProvider;
pub use provider::{GenerationResult, LlmConfig, LlmProvider};
