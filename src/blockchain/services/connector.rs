// src/blockchain/services/connector.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::blockchain::{
    models::{ConnectionInfo, Network, ProviderStatus},
    provider::{ChainProvider, ProviderSlot},
};
use crate::config::Config;
use crate::error::{AgentError, AgentResult};

/// Polling bounds and the optional network requirement.
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub required_network: Option<Network>,
}

impl ConnectorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.connect_timeout_ms),
            poll_interval: Duration::from_millis(config.connect_poll_interval_ms.max(1)),
            required_network: config.required_network,
        }
    }
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(8_000),
            poll_interval: Duration::from_millis(150),
            required_network: None,
        }
    }
}

#[derive(Clone)]
pub struct WalletConnector {
    slot: ProviderSlot,
    settings: ConnectorSettings,
}

impl WalletConnector {
    pub fn new(slot: ProviderSlot, settings: ConnectorSettings) -> Self {
        Self { slot, settings }
    }

    /// Waits for a provider to be injected, up to the configured timeout.
    pub async fn wait_for_provider(&self) -> Option<Arc<dyn ChainProvider>> {
        let deadline = Instant::now() + self.settings.timeout;
        loop {
            if let Some(provider) = self.slot.current().await {
                return Some(provider);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Reports whether a provider is injected and ready, without asking for access.
    pub async fn check_provider(&self) -> ProviderStatus {
        match self.wait_for_provider().await {
            Some(provider) => {
                let status = ProviderStatus {
                    present: true,
                    ready: provider.ready(),
                    address: provider.selected_address(),
                    node_host: Some(provider.node_host()),
                };
                debug!(?status, "provider detected");
                status
            }
            None => {
                warn!(timeout = ?self.settings.timeout, "no provider injected");
                ProviderStatus::default()
            }
        }
    }

    /// Requests account access and resolves the connected account and network.
    pub async fn connect(&self) -> AgentResult<ConnectionInfo> {
        let provider = self
            .wait_for_provider()
            .await
            .ok_or(AgentError::ProviderMissing)?;

        // The provider may prompt the user here; there is no upper bound on this wait.
        provider.request_access().await?;

        let address = self.wait_for_address().await?;

        let provider = self.slot.current().await.ok_or(AgentError::ProviderMissing)?;
        let node_host = provider.node_host();
        let network = Network::classify(&node_host);

        if let Some(expected) = self.settings.required_network {
            if expected != network {
                return Err(AgentError::WrongNetwork {
                    expected,
                    actual: network,
                });
            }
        }

        info!(%address, %node_host, %network, "wallet connected");
        Ok(ConnectionInfo {
            address,
            node_host,
            network,
        })
    }

    // The provider finishes its own injection asynchronously, so the address can lag
    // behind a granted access request.
    async fn wait_for_address(&self) -> AgentResult<String> {
        let deadline = Instant::now() + self.settings.timeout;
        loop {
            let provider = self.slot.current().await.ok_or(AgentError::ProviderMissing)?;
            if let Some(address) = provider.selected_address().filter(|a| !a.is_empty()) {
                return Ok(address);
            }
            if Instant::now() >= deadline {
                return Err(AgentError::NoAccount);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
