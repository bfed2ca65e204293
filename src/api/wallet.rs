use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::{
    api::error_response,
    blockchain::models::{ConnectionInfo, ProviderStatus, WalletSnapshot},
    AppState,
};

/// Report whether a provider is injected, without requesting access
pub async fn status_handler(State(state): State<AppState>) -> Json<ProviderStatus> {
    Json(state.connector.check_provider().await)
}

/// Request account access and resolve the connected account
pub async fn connect_handler(
    State(state): State<AppState>,
) -> Result<Json<ConnectionInfo>, (StatusCode, String)> {
    info!("Handling wallet connect request");
    state.connector.connect().await.map(Json).map_err(|e| {
        error!("Failed to connect wallet: {}", e);
        error_response(e)
    })
}

/// Connect and build a fresh wallet snapshot
pub async fn snapshot_handler(
    State(state): State<AppState>,
) -> Result<Json<WalletSnapshot>, (StatusCode, String)> {
    let connection = state.connector.connect().await.map_err(error_response)?;
    match state.snapshots.snapshot(&connection).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            error!("Failed to build snapshot for {}: {}", connection.address, e);
            Err(error_response(e))
        }
    }
}
