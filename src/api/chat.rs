use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::{
    agent::{
        protocol::ChatRequest,
        session::{ChatLine, Session},
        widget::Widget,
    },
    AppState,
};

// --- Response Models ---

/// Result of one chat turn
#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub session_id: String,
    /// Lines the turn appended to the transcript
    pub lines: Vec<ChatLine>,
    /// Widget the session shows after the turn
    pub widget: Widget,
}

// --- Handlers ---

/// Run one chat turn. Turns of the same session are serialized.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(input): Json<ChatRequest>,
) -> Result<Json<ChatTurnResponse>, (StatusCode, String)> {
    input
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    info!(session = %input.session_id, "handling chat message");

    let session = state.sessions.get_or_create(&input.session_id);
    let mut session = session.lock().await;
    let lines = state.agent.handle_message(&mut session, &input.message).await;

    Ok(Json(ChatTurnResponse {
        session_id: session.id.clone(),
        lines,
        widget: session.widget.clone(),
    }))
}

/// Get a session's transcript and widget
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("session '{}' not found", id)))?;
    let session = session.lock().await.clone();
    Ok(Json(session))
}
