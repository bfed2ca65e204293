// src/agent/mod.rs

//! # Agent Module
//!
//! The chat turn: post the user's message to the backend, run the returned tool calls
//! locally, summarize what ran and leave the session with its transcript and widget.

pub mod backend;
pub mod handler;
pub mod protocol;
pub mod reporter;
pub mod session;
pub mod widget;

use tracing::{debug, info, warn};

use crate::agent::{
    backend::BackendClient,
    handler::Dispatcher,
    protocol::{ChatRequest, SummarizeRequest},
    session::{ChatLine, Role, Session},
};

pub use handler::{ExecutedTool, TurnOutcome};
pub use widget::Widget;

#[derive(Clone)]
pub struct Agent {
    backend: BackendClient,
    dispatcher: Dispatcher,
}

impl Agent {
    pub fn new(backend: BackendClient, dispatcher: Dispatcher) -> Self {
        Self {
            backend,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs one turn and returns the lines it appended to the transcript.
    pub async fn handle_message(&self, session: &mut Session, text: &str) -> Vec<ChatLine> {
        let start = session.transcript.len();
        session.push(Role::User, text);

        let request = ChatRequest {
            message: text.to_string(),
            session_id: session.id.clone(),
        };
        let response = match self.backend.chat(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session = %session.id, error = %e, "chat backend unreachable");
                session.push(
                    Role::System,
                    "Backend is unreachable. Check that the backend is running and try again.",
                );
                return session.transcript[start..].to_vec();
            }
        };

        info!(
            session = %session.id,
            calls = response.function_calls.len(),
            "chat reply received"
        );
        if !response.reply.trim().is_empty() {
            session.push(Role::Assistant, response.reply.trim());
        }
        if let Some(widget) = &response.widget {
            debug!(?widget, "ignoring widget hint from chat reply");
        }

        let outcome = self
            .dispatcher
            .run_batch(&session.id, &response.function_calls)
            .await;
        for line in &outcome.lines {
            session.push(Role::Assistant, line.clone());
        }
        if let Some(widget) = outcome.widget {
            session.widget = widget;
        }

        for executed in &outcome.executed {
            let request = SummarizeRequest {
                session_id: &session.id,
                tool: &executed.tool,
                result: &executed.result,
            };
            match self.backend.summarize(&request).await {
                Ok(summary) => {
                    if let Some(widget) = &summary.widget {
                        debug!(tool = %executed.tool, ?widget, "ignoring widget hint from summary");
                    }
                    if !summary.reply.trim().is_empty() {
                        session.push(Role::Assistant, summary.reply.trim());
                    }
                }
                Err(e) => warn!(tool = %executed.tool, error = %e, "summarize failed, skipping"),
            }
        }

        session.transcript[start..].to_vec()
    }
}
