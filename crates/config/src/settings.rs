use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Controls how strictly [`Settings::validate`] enforces its checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            stt: SttConfig::default(),
            tts: TtsConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_channel_path")]
    pub channel_path: String,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_channel_path() -> String {
    "/voicechat".to_string()
}
fn default_max_payload_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            channel_path: default_channel_path(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    120
}
fn default_max_duration_secs() -> u64 {
    3_600
}
fn default_cleanup_interval_secs() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            max_duration_secs: default_max_duration_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_stt_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_stt_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_stt_connect_timeout_secs() -> u64 {
    5
}
fn default_stt_inactivity_timeout_secs() -> u64 {
    30
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_stt_connect_timeout_secs(),
            inactivity_timeout_secs: default_stt_inactivity_timeout_secs(),
            endpoint: String::new(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,
    #[serde(default = "default_tts_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
    #[serde(default = "default_tts_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

fn default_tts_synthesis_timeout_secs() -> u64 {
    20
}
fn default_tts_keepalive_interval_secs() -> u64 {
    8
}
fn default_tts_max_concurrent_sessions() -> usize {
    256
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_secs: default_tts_synthesis_timeout_secs(),
            keepalive_interval_secs: default_tts_keepalive_interval_secs(),
            max_concurrent_sessions: default_tts_max_concurrent_sessions(),
            endpoint: String::new(),
            api_key: None,
            voice_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_llm_max_messages_per_context")]
    pub max_messages_per_context: usize,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_llm_system_prompt")]
    pub system_prompt: String,
}

fn default_llm_request_timeout_secs() -> u64 {
    30
}
fn default_llm_max_messages_per_context() -> usize {
    50
}
fn default_llm_system_prompt() -> String {
    "You are a helpful, concise voice assistant. Keep replies short enough to speak naturally.".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_llm_request_timeout_secs(),
            max_messages_per_context: default_llm_max_messages_per_context(),
            endpoint: String::new(),
            api_key: None,
            model: String::new(),
            system_prompt: default_llm_system_prompt(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_payload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_payload_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.session.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.idle_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.session.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cleanup_interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.tts.max_concurrent_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tts.max_concurrent_sessions".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.llm.max_messages_per_context == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_messages_per_context".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.environment.is_production() {
            if self.stt.endpoint.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "stt.endpoint".to_string(),
                    message: "required in production".to_string(),
                });
            }
            if self.tts.endpoint.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "tts.endpoint".to_string(),
                    message: "required in production".to_string(),
                });
            }
            if self.llm.endpoint.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "llm.endpoint".to_string(),
                    message: "required in production".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Layered load, highest precedence last:
/// 1. `config/default.{toml,yaml,json}` (if present)
/// 2. `config/{env}.{toml,yaml,json}` (if `env` is given and present)
/// 3. `VOICEGATE__`-prefixed environment variables (`__` as the nesting separator)
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix("VOICEGATE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_in_development() {
        let settings = Settings::default();
        assert_eq!(settings.environment, RuntimeEnvironment::Development);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn production_requires_provider_endpoints() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());

        settings.stt.endpoint = "wss://stt.example.com".to_string();
        settings.tts.endpoint = "wss://tts.example.com".to_string();
        settings.llm.endpoint = "https://llm.example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_zero_cleanup_interval() {
        let mut settings = Settings::default();
        settings.session.cleanup_interval_secs = 0;
        assert!(settings.validate().is_err());
    }
}
