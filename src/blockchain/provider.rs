// src/blockchain/provider.rs

//! The chain provider capability and the slot it is injected into.

use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::abi::Token;
use tokio::sync::RwLock;

use crate::blockchain::models::{AccountInfo, AccountResources};
use crate::error::ProviderError;

/// Everything the agent needs from a wallet/node provider.
///
/// Implementations are expected to be cheap to call repeatedly: the connector polls
/// `ready` and `selected_address` while it waits for the provider to settle.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Whether the provider finished its own initialization.
    fn ready(&self) -> bool;

    /// The account currently exposed to the agent, if any.
    fn selected_address(&self) -> Option<String>;

    /// Host string of the node the provider is talking to.
    fn node_host(&self) -> String;

    /// Asks the user (or the provider's policy) for account access.
    async fn request_access(&self) -> Result<(), ProviderError>;

    /// Native balance in base units.
    async fn get_balance(&self, address: &str) -> Result<u64, ProviderError>;

    async fn get_account(&self, address: &str) -> Result<AccountInfo, ProviderError>;

    async fn get_account_resources(&self, address: &str)
        -> Result<AccountResources, ProviderError>;

    /// Calls a view method and returns the raw ABI-encoded return data.
    async fn call_read_only(
        &self,
        contract: &str,
        function_signature: &str,
        args: &[Token],
    ) -> Result<Vec<u8>, ProviderError>;
}

/// Holder for the currently injected provider.
///
/// Callers re-read the slot on every operation instead of keeping a handle around.
#[derive(Clone, Default)]
pub struct ProviderSlot {
    inner: Arc<RwLock<Option<Arc<dyn ChainProvider>>>>,
}

impl ProviderSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(provider))),
        }
    }

    pub async fn inject(&self, provider: Arc<dyn ChainProvider>) {
        *self.inner.write().await = Some(provider);
    }

    pub async fn eject(&self) {
        *self.inner.write().await = None;
    }

    pub async fn current(&self) -> Option<Arc<dyn ChainProvider>> {
        self.inner.read().await.clone()
    }
}
