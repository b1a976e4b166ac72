//! Layered configuration for the voice conversation gateway: defaults,
//! then an optional environment-named file, then `VOICEGATE__`-prefixed
//! environment variables (spec.md §6).

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{
    load_settings, LlmConfig, RuntimeEnvironment, ServerConfig, SessionConfig, Settings,
    SttConfig, TtsConfig,
};
