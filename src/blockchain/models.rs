// src/blockchain/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Network ---

/// Network a node host resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Nile,
    Mainnet,
    Unknown,
}

impl Network {
    /// Classifies a node host by substring markers. Never fails; unmatched hosts are `Unknown`.
    pub fn classify(node_host: &str) -> Self {
        let host = node_host.to_lowercase();
        if host.contains("nile") {
            Network::Nile
        } else if host.contains("api.trongrid.io") || host.contains("mainnet") {
            Network::Mainnet
        } else {
            Network::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Nile => "nile",
            Network::Mainnet => "mainnet",
            Network::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nile" => Ok(Network::Nile),
            "mainnet" | "main" => Ok(Network::Mainnet),
            other => Err(format!("unsupported network: {}", other)),
        }
    }
}

// --- Wallet Models ---

/// Result of a successful wallet connection. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub address: String,
    pub node_host: String,
    pub network: Network,
}

/// Presence report for the injected provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub present: bool,
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_host: Option<String>,
}

/// Account metadata in base units (sun), as read from the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountInfo {
    pub frozen_for_bandwidth_sun: u64,
    pub frozen_for_energy_sun: u64,
    pub owner_keys: u32,
    pub owner_threshold: u64,
    pub active_permissions: u32,
}

/// Resource usage counters, as read from the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountResources {
    pub energy_used: u64,
    pub energy_limit: u64,
    pub net_used: u64,
    pub net_limit: u64,
    pub free_net_used: u64,
    pub free_net_limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyUsage {
    pub used: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandwidthUsage {
    pub used: u64,
    pub limit: u64,
    pub free_used: u64,
    pub free_limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionSummary {
    pub owner_keys: u32,
    pub owner_threshold: u64,
    pub active_count: u32,
}

/// Point-in-time aggregate of one account. Amounts are in display units (TRX).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: String,
    pub node_host: String,
    pub network: Network,
    pub native_balance: f64,
    pub energy: EnergyUsage,
    pub bandwidth: BandwidthUsage,
    pub frozen_for_bandwidth: f64,
    pub frozen_for_energy: f64,
    pub permissions: PermissionSummary,
    pub fetched_at: DateTime<Utc>,
}

// --- Lending Models ---

/// One lending market with annualized rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub address: String,
    pub symbol: String,
    #[serde(alias = "supply_apy_pct_approx")]
    pub supply_apy_pct: f64,
    #[serde(alias = "borrow_apy_pct_approx")]
    pub borrow_apy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub unitroller: String,
    pub count: usize,
    #[serde(default)]
    pub requested_limit: usize,
    pub markets: Vec<MarketRow>,
}

/// A market row plus the raw protocol values behind it. Mantissas are decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDetail {
    #[serde(flatten)]
    pub row: MarketRow,
    pub collateral_factor_pct: f64,
    pub supply_rate_per_block: String,
    pub borrow_rate_per_block: String,
    pub exchange_rate_mantissa: String,
    pub total_borrows_mantissa: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDetailResult {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub unitroller: String,
    pub market: MarketDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPosition {
    pub jtoken: String,
    pub symbol: String,
    pub token_balance_mantissa: String,
    pub borrow_balance_mantissa: String,
    pub exchange_rate_mantissa: String,
}

impl MarketPosition {
    pub fn is_active(&self) -> bool {
        self.token_balance_mantissa != "0" || self.borrow_balance_mantissa != "0"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosition {
    #[serde(default)]
    pub network: String,
    pub address: String,
    pub positions: Vec<MarketPosition>,
    pub liquidity_mantissa: String,
    pub shortfall_mantissa: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_hosts() {
        assert_eq!(Network::classify("https://nile.trongrid.io"), Network::Nile);
        assert_eq!(Network::classify("https://api.trongrid.io"), Network::Mainnet);
        assert_eq!(Network::classify("MAINNET.example.org"), Network::Mainnet);
        assert_eq!(Network::classify("https://api.shasta.trongrid.io"), Network::Unknown);
        assert_eq!(Network::classify(""), Network::Unknown);
    }

    #[test]
    fn market_row_accepts_backend_field_names() {
        let row: MarketRow = serde_json::from_value(serde_json::json!({
            "address": "TX1",
            "symbol": "jUSDT",
            "supply_apy_pct_approx": 3.1,
            "borrow_apy_pct_approx": 5.2,
            "exchange_rate_mantissa": "1"
        }))
        .unwrap();
        assert_eq!(row.symbol, "jUSDT");
        assert_eq!(row.supply_apy_pct, 3.1);
        assert_eq!(row.borrow_apy_pct, 5.2);
    }
}
