//! Voice Conversation Gateway server: the WebSocket Connection Gateway
//! (spec.md §4.D) plus its HTTP health/readiness/metrics surface.

pub mod gateway;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod state;

pub use gateway::ws_handler;
pub use http::create_router;
pub use state::AppState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("session error: {0}")]
    Session(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
