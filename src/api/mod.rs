//! # API Module
//!
//! Local HTTP surface over the agent, nested under `/api`.
//!
//! ## Available Endpoints
//!
//! - `GET /health` - Liveness check
//! - `POST /chat` - Run one chat turn for a session
//! - `GET /session/:id` - Transcript and widget of a session
//! - `GET /wallet/status` - Provider presence, without requesting access
//! - `POST /wallet/connect` - Request access and resolve the account
//! - `GET /wallet/snapshot` - Connect, then read balance and resources
//! - `GET /markets?limit=` - JustLend markets with APYs
//! - `GET /markets/:symbol` - One market by symbol
//! - `GET /positions/:address` - An account's JustLend positions

pub mod chat;
pub mod health;
pub mod markets;
pub mod wallet;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::error::AgentError;
use crate::AppState;

/// Builds the `/api` routes. The caller attaches state and layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat::chat_handler))
        .route("/session/:id", get(chat::get_session_handler))
        .route("/wallet/status", get(wallet::status_handler))
        .route("/wallet/connect", post(wallet::connect_handler))
        .route("/wallet/snapshot", get(wallet::snapshot_handler))
        .route("/markets", get(markets::list_markets_handler))
        .route("/markets/:symbol", get(markets::market_detail_handler))
        .route("/positions/:address", get(markets::user_position_handler))
}

/// Maps an agent error to the status and message returned to HTTP callers.
pub fn error_response(err: AgentError) -> (StatusCode, String) {
    let status = match &err {
        AgentError::ProviderMissing | AgentError::ProviderUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AgentError::NoAccount => StatusCode::FORBIDDEN,
        AgentError::WrongNetwork { .. } => StatusCode::CONFLICT,
        AgentError::BackendUnreachable(_) | AgentError::PerMarketReadFailure { .. } => {
            StatusCode::BAD_GATEWAY
        }
        AgentError::MarketNotFound { .. } => StatusCode::NOT_FOUND,
        AgentError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        AgentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, format!("{}: {}", err.kind(), err))
}
