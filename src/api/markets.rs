use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    api::error_response,
    blockchain::{
        address::is_valid_address,
        models::{MarketDetailResult, MarketListing, UserPosition},
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    pub limit: Option<usize>,
}

/// List JustLend markets with annualized rates
pub async fn list_markets_handler(
    State(state): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Result<Json<MarketListing>, (StatusCode, String)> {
    state.markets.list_markets(query.limit).await.map(Json).map_err(|e| {
        error!("Failed to list markets: {}", e);
        error_response(e)
    })
}

/// Get one market by symbol
pub async fn market_detail_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<MarketDetailResult>, (StatusCode, String)> {
    state
        .markets
        .market_detail(&symbol)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Get an account's supply/borrow positions
pub async fn user_position_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<UserPosition>, (StatusCode, String)> {
    if !is_valid_address(&address) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("invalid TRON address: {}", address),
        ));
    }
    state
        .markets
        .user_position(&address)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to read positions for {}: {}", address, e);
            error_response(e)
        })
}
