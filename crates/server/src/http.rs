//! HTTP surface: health/readiness/metrics plus the WebSocket upgrade
//! route, assembled the way the teacher's `create_router` builds its
//! router (CORS + trace layers, `with_state`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::ws_handler;
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let channel_path = state.settings.server.channel_path.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route(&channel_path, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /health` — `{status, uptime, activeSessions, totalConnections}`
/// per the external interface's health endpoint contract.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptime": state.uptime_secs(),
        "activeSessions": state.session_registry.len(),
        "totalConnections": state.total_connections.load(std::sync::atomic::Ordering::Relaxed),
    }))
}

/// `GET /ready` — distinct from `/health`: reports whether the process
/// is ready to accept new channels, not just whether it is alive.
/// Configuration was already validated at startup, so readiness here
/// only needs to confirm the session registry is still reachable.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let session_count = state.session_registry.len();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ready",
            "activeSessions": session_count,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use voicegate_llm::{EchoLlmProvider, LlmContext, LlmEngine};
    use voicegate_session::SessionRegistry;
    use voicegate_stt::EchoSttProvider;
    use voicegate_tts::EchoTtsProvider;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(voicegate_config::Settings::default()),
            Arc::new(SessionRegistry::new(
                Duration::from_secs(60),
                Duration::from_secs(3600),
            )),
            Arc::new(EchoSttProvider::new()),
            Arc::new(EchoTtsProvider::new()),
            Arc::new(LlmEngine::new(
                Arc::new(EchoLlmProvider::new()),
                Arc::new(LlmContext::new(50, Duration::from_secs(1800))),
            )),
        )
    }

    #[test]
    fn router_builds_with_default_state() {
        let _ = create_router(test_state());
    }
}
