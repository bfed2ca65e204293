// src/agent/backend.rs

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::agent::protocol::{ChatRequest, ChatResponse, SummarizeRequest, SummarizeResponse};
use crate::error::{AgentError, AgentResult};

/// HTTP client for the chat backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn chat(&self, request: &ChatRequest) -> AgentResult<ChatResponse> {
        self.post_for("/api/chat", request).await
    }

    pub async fn summarize(&self, request: &SummarizeRequest<'_>) -> AgentResult<SummarizeResponse> {
        self.post_for("/api/chat/summarize", request).await
    }

    /// Posts a body and ignores the response payload.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AgentResult<()> {
        self.send(path, body).await.map(|_| ())
    }

    async fn post_for<B, T>(&self, path: &str, body: &B) -> AgentResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::BackendUnreachable(format!("{}: invalid response: {}", path, e)))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "posting to backend");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnreachable(format!("{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::BackendUnreachable(format!(
                "{} returned {}: {}",
                path, status, text
            )));
        }
        Ok(response)
    }
}
