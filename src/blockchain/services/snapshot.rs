// src/blockchain/services/snapshot.rs

use chrono::Utc;
use tracing::{error, info};

use crate::blockchain::{
    models::{BandwidthUsage, ConnectionInfo, EnergyUsage, PermissionSummary, WalletSnapshot},
    provider::ProviderSlot,
};
use crate::error::{AgentError, AgentResult};

/// Base units per display unit of the native token (sun per TRX).
pub const SUN_PER_TRX: f64 = 1_000_000.0;

pub fn sun_to_trx(sun: u64) -> f64 {
    sun as f64 / SUN_PER_TRX
}

#[derive(Clone)]
pub struct SnapshotBuilder {
    slot: ProviderSlot,
}

impl SnapshotBuilder {
    pub fn new(slot: ProviderSlot) -> Self {
        Self { slot }
    }

    /// Reads balance, account metadata and resources concurrently and composes one record.
    ///
    /// All three reads are required: if any fails the snapshot fails with
    /// `ProviderUnavailable`. Fields the node leaves out of a successful response are zero.
    pub async fn snapshot(&self, connection: &ConnectionInfo) -> AgentResult<WalletSnapshot> {
        let provider = self.slot.current().await.ok_or_else(|| {
            AgentError::ProviderUnavailable("no provider injected".to_string())
        })?;
        let address = connection.address.as_str();

        let (balance, account, resources) = tokio::try_join!(
            provider.get_balance(address),
            provider.get_account(address),
            provider.get_account_resources(address),
        )
        .map_err(|e| {
            error!(%address, error = %e, "snapshot read failed");
            AgentError::ProviderUnavailable(e.to_string())
        })?;

        let snapshot = WalletSnapshot {
            address: connection.address.clone(),
            node_host: connection.node_host.clone(),
            network: connection.network,
            native_balance: sun_to_trx(balance),
            energy: EnergyUsage {
                used: resources.energy_used,
                limit: resources.energy_limit,
            },
            bandwidth: BandwidthUsage {
                used: resources.net_used,
                limit: resources.net_limit,
                free_used: resources.free_net_used,
                free_limit: resources.free_net_limit,
            },
            frozen_for_bandwidth: sun_to_trx(account.frozen_for_bandwidth_sun),
            frozen_for_energy: sun_to_trx(account.frozen_for_energy_sun),
            permissions: PermissionSummary {
                owner_keys: account.owner_keys,
                owner_threshold: account.owner_threshold,
                active_count: account.active_permissions,
            },
            fetched_at: Utc::now(),
        };
        info!(%address, balance = snapshot.native_balance, "wallet snapshot built");
        Ok(snapshot)
    }
}
