//! Process entrypoint: load configuration, wire up the provider stack,
//! and serve the Connection Gateway until a shutdown signal arrives.
//!
//! Mirrors the teacher's `main.rs` shape: layered config load, tracing
//! init, metrics init, router construction, `axum::serve` with
//! graceful shutdown on Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use voicegate_config::{LlmConfig as SettingsLlmConfig, Settings};
use voicegate_llm::{EchoLlmProvider, HttpLlmProvider, LlmConfig, LlmContext, LlmEngine, LlmProvider};
use voicegate_server::{create_router, metrics as server_metrics, AppState};
use voicegate_session::SessionRegistry;
use voicegate_stt::{EchoSttProvider, SttProvider, WsSttConfig, WsSttProvider};
use voicegate_tts::{EchoTtsProvider, TtsProvider, WsTtsConfig, WsTtsProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("VOICEGATE_ENV").ok();
    let settings = voicegate_config::load_settings(env.as_deref())?;
    let settings = Arc::new(settings);

    init_tracing(&settings);
    tracing::info!(
        environment = ?settings.environment,
        listen_port = settings.server.listen_port,
        channel_path = %settings.server.channel_path,
        "starting voicegate"
    );

    server_metrics::init_metrics();

    let session_registry = Arc::new(SessionRegistry::new(
        Duration::from_secs(settings.session.idle_timeout_secs),
        Duration::from_secs(settings.session.max_duration_secs),
    ));
    let _sweep_shutdown = session_registry
        .start_sweep_task(Duration::from_secs(settings.session.cleanup_interval_secs));

    let stt_provider = build_stt_provider(&settings);
    let tts_provider = build_tts_provider(&settings);
    let llm_engine = Arc::new(build_llm_engine(&settings)?);

    let state = AppState::new(
        settings.clone(),
        session_registry,
        stt_provider,
        tts_provider,
        llm_engine,
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.listen_port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn build_stt_provider(settings: &Settings) -> Arc<dyn SttProvider> {
    if settings.stt.endpoint.is_empty() {
        tracing::warn!("stt.endpoint not configured, using the echo/loopback STT provider");
        Arc::new(EchoSttProvider::new())
    } else {
        Arc::new(WsSttProvider::new(WsSttConfig {
            endpoint: settings.stt.endpoint.clone(),
            api_key: settings.stt.api_key.clone().unwrap_or_default(),
        }))
    }
}

fn build_tts_provider(settings: &Settings) -> Arc<dyn TtsProvider> {
    if settings.tts.endpoint.is_empty() {
        tracing::warn!("tts.endpoint not configured, using the echo/loopback TTS provider");
        Arc::new(EchoTtsProvider::new())
    } else {
        Arc::new(WsTtsProvider::new(WsTtsConfig {
            endpoint: settings.tts.endpoint.clone(),
            api_key: settings.tts.api_key.clone().unwrap_or_default(),
        }))
    }
}

fn build_llm_engine(settings: &Settings) -> anyhow::Result<LlmEngine> {
    let context = Arc::new(LlmContext::new(
        settings.llm.max_messages_per_context,
        Duration::from_secs(30 * 60),
    ));

    let provider: Arc<dyn LlmProvider> = if settings.llm.endpoint.is_empty() {
        tracing::warn!("llm.endpoint not configured, using the echo/loopback LLM provider");
        Arc::new(EchoLlmProvider::new())
    } else {
        Arc::new(HttpLlmProvider::new(provider_config_from_settings(
            &settings.llm,
        ))?)
    };

    Ok(LlmEngine::new(provider, context))
}

fn provider_config_from_settings(settings: &SettingsLlmConfig) -> LlmConfig {
    LlmConfig {
        model: settings.model.clone(),
        endpoint: settings.endpoint.clone(),
        api_key: settings.api_key.clone(),
        timeout: Duration::from_secs(settings.request_timeout_secs),
        ..LlmConfig::default()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voicegate=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
