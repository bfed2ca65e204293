// src/lib.rs

use std::time::Duration;

// Re-export modules
pub mod agent;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod utils;

use agent::{
    backend::BackendClient, handler::Dispatcher, reporter::Reporter, session::SessionStore, Agent,
};
use blockchain::{
    provider::ProviderSlot,
    services::{
        connector::{ConnectorSettings, WalletConnector},
        lending::{MarketReader, MarketReaderSettings},
        snapshot::SnapshotBuilder,
    },
};
use error::AgentResult;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Slot the chain provider is injected into
    pub provider: ProviderSlot,
    /// Chat turn runner
    pub agent: Agent,
    /// Sessions by id
    pub sessions: SessionStore,
    pub connector: WalletConnector,
    pub snapshots: SnapshotBuilder,
    pub markets: MarketReader,
}

impl AppState {
    /// Wires every component around one provider slot.
    pub fn new(config: config::Config, provider: ProviderSlot) -> AgentResult<Self> {
        let backend = BackendClient::new(
            &config.backend_url,
            Duration::from_secs(config.http_timeout_secs),
        )?;
        let reporter = Reporter::new(backend.clone());
        let connector =
            WalletConnector::new(provider.clone(), ConnectorSettings::from_config(&config));
        let snapshots = SnapshotBuilder::new(provider.clone());
        let markets =
            MarketReader::new(provider.clone(), MarketReaderSettings::from_config(&config));
        let dispatcher = Dispatcher::new(
            connector.clone(),
            snapshots.clone(),
            markets.clone(),
            reporter,
        );

        Ok(Self {
            agent: Agent::new(backend, dispatcher),
            sessions: SessionStore::with_capacity(config.max_sessions),
            config,
            provider,
            connector,
            snapshots,
            markets,
        })
    }

    pub fn reporter(&self) -> &Reporter {
        self.agent.dispatcher().reporter()
    }
}
