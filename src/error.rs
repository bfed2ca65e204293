// src/error.rs

use thiserror::Error;

use crate::blockchain::models::Network;

/// Failures raised by a `ChainProvider` implementation.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("node returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("account access was denied")]
    AccessDenied,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Errors surfaced by the agent's handlers.
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("wallet provider is not installed or not injected")]
    ProviderMissing,
    #[error("wallet provider exposes no account (locked or access rejected)")]
    NoAccount,
    #[error("wallet is on {actual} but {expected} is required")]
    WrongNetwork { expected: Network, actual: Network },
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),
    #[error("market {market} read failed: {reason}")]
    PerMarketReadFailure { market: String, reason: String },
    #[error("market symbol '{symbol}' not found on {network}")]
    MarketNotFound { symbol: String, network: String },
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Stable identifier reported to the backend alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::ProviderMissing => "ProviderMissing",
            AgentError::NoAccount => "NoAccount",
            AgentError::WrongNetwork { .. } => "WrongNetwork",
            AgentError::ProviderUnavailable(_) => "ProviderUnavailable",
            AgentError::BackendUnreachable(_) => "BackendUnreachable",
            AgentError::PerMarketReadFailure { .. } => "PerMarketReadFailure",
            AgentError::MarketNotFound { .. } => "MarketNotFound",
            AgentError::InvalidAddress(_) => "InvalidAddress",
            AgentError::Config(_) => "Config",
        }
    }
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::AccessDenied => AgentError::NoAccount,
            ProviderError::InvalidAddress(addr) => AgentError::InvalidAddress(addr),
            other => AgentError::ProviderUnavailable(other.to_string()),
        }
    }
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;
