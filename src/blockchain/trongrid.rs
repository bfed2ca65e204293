// src/blockchain/trongrid.rs

use std::time::Duration;

use async_trait::async_trait;
use ethers_core::abi::{encode, Token};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::blockchain::{
    address::ZERO_ADDRESS,
    models::{AccountInfo, AccountResources},
    provider::ChainProvider,
};
use crate::config::Config;
use crate::error::ProviderError;

/// Selector of `Error(string)`, the payload of a reverted call.
const REVERT_SELECTOR: &str = "08c379a0";

/// `ChainProvider` backed by a TRON full node's HTTP API (TronGrid compatible).
#[derive(Clone)]
pub struct TronGridProvider {
    client: Client,
    node_url: String,
    api_key: Option<String>,
    account: Option<String>,
}

impl TronGridProvider {
    pub fn new(
        node_url: &str,
        api_key: Option<String>,
        account: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            node_url: node_url.trim_end_matches('/').to_string(),
            api_key,
            account,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(
            &config.tron_node_url,
            config.trongrid_api_key.clone(),
            config.wallet_address.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.node_url, path);
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("TRON-PRO-API-KEY", key);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        debug!(%status, path, "node response");
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Decode(format!("{}: {}", path, e)))?;
        if let Some(err) = value.get("Error").and_then(|e| e.as_str()) {
            return Err(ProviderError::Rpc(err.to_string()));
        }
        Ok(value)
    }

    async fn fetch_account(&self, address: &str) -> Result<RawAccount, ProviderError> {
        let value = self
            .post("/wallet/getaccount", json!({ "address": address, "visible": true }))
            .await?;
        serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainProvider for TronGridProvider {
    fn ready(&self) -> bool {
        self.account.is_some()
    }

    fn selected_address(&self) -> Option<String> {
        self.account.clone()
    }

    fn node_host(&self) -> String {
        url::Url::parse(&self.node_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.node_url.clone())
    }

    async fn request_access(&self) -> Result<(), ProviderError> {
        if self.account.is_some() {
            Ok(())
        } else {
            warn!("No WALLET_ADDRESS configured; refusing account access");
            Err(ProviderError::AccessDenied)
        }
    }

    // Balance and account are separate reads, each with its own getaccount request.
    async fn get_balance(&self, address: &str) -> Result<u64, ProviderError> {
        Ok(self.fetch_account(address).await?.balance)
    }

    async fn get_account(&self, address: &str) -> Result<AccountInfo, ProviderError> {
        Ok(self.fetch_account(address).await?.into_account_info())
    }

    async fn get_account_resources(
        &self,
        address: &str,
    ) -> Result<AccountResources, ProviderError> {
        let value = self
            .post(
                "/wallet/getaccountresource",
                json!({ "address": address, "visible": true }),
            )
            .await?;
        let raw: RawResources =
            serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(AccountResources {
            energy_used: raw.energy_used,
            energy_limit: raw.energy_limit,
            net_used: raw.net_used,
            net_limit: raw.net_limit,
            free_net_used: raw.free_net_used,
            free_net_limit: raw.free_net_limit,
        })
    }

    async fn call_read_only(
        &self,
        contract: &str,
        function_signature: &str,
        args: &[Token],
    ) -> Result<Vec<u8>, ProviderError> {
        let owner = self.account.as_deref().unwrap_or(ZERO_ADDRESS);
        let payload = json!({
            "owner_address": owner,
            "contract_address": contract,
            "function_selector": function_signature,
            "parameter": hex::encode(encode(args)),
            "visible": true
        });
        let value = self.post("/wallet/triggerconstantcontract", payload).await?;
        decode_constant_result(&value, function_signature)
    }
}

fn decode_constant_result(value: &Value, function_signature: &str) -> Result<Vec<u8>, ProviderError> {
    let ok = value
        .pointer("/result/result")
        .and_then(|r| r.as_bool())
        .unwrap_or(false);
    if !ok {
        let message = value
            .pointer("/result/message")
            .and_then(|m| m.as_str())
            .map(decode_hex_message)
            .unwrap_or_else(|| value.to_string());
        return Err(ProviderError::Rpc(format!("{}: {}", function_signature, message)));
    }

    let raw = value
        .get("constant_result")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            ProviderError::Decode(format!("{}: missing constant_result", function_signature))
        })?;
    if raw.starts_with(REVERT_SELECTOR) {
        return Err(ProviderError::Rpc(format!("{}: call reverted", function_signature)));
    }
    hex::decode(raw).map_err(|e| ProviderError::Decode(format!("{}: {}", function_signature, e)))
}

// Node error messages arrive hex-encoded; fall back to the raw text when they are not.
fn decode_hex_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct RawAccount {
    #[serde(default)]
    balance: u64,
    #[serde(default)]
    frozen: Vec<RawFrozen>,
    #[serde(default, rename = "frozenV2")]
    frozen_v2: Vec<RawFrozenV2>,
    #[serde(default)]
    account_resource: RawAccountResource,
    #[serde(default)]
    owner_permission: Option<RawPermission>,
    #[serde(default)]
    active_permission: Vec<RawPermission>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFrozen {
    #[serde(default)]
    frozen_balance: u64,
}

#[derive(Debug, Default, Deserialize)]
struct RawFrozenV2 {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    amount: u64,
}

#[derive(Debug, Default, Deserialize)]
struct RawAccountResource {
    #[serde(default)]
    frozen_balance_for_energy: RawFrozen,
}

#[derive(Debug, Default, Deserialize)]
struct RawPermission {
    #[serde(default)]
    threshold: u64,
    #[serde(default)]
    keys: Vec<Value>,
}

impl RawAccount {
    fn into_account_info(self) -> AccountInfo {
        let mut bandwidth: u64 = self.frozen.iter().map(|f| f.frozen_balance).sum();
        let mut energy = self.account_resource.frozen_balance_for_energy.frozen_balance;
        for entry in &self.frozen_v2 {
            // Stake 2.0 entries without a type are bandwidth stakes.
            match entry.kind.as_deref() {
                None | Some("BANDWIDTH") => bandwidth += entry.amount,
                Some("ENERGY") => energy += entry.amount,
                Some(_) => {}
            }
        }
        let (owner_keys, owner_threshold) = self
            .owner_permission
            .as_ref()
            .map(|p| (p.keys.len() as u32, p.threshold))
            .unwrap_or((0, 0));

        AccountInfo {
            frozen_for_bandwidth_sun: bandwidth,
            frozen_for_energy_sun: energy,
            owner_keys,
            owner_threshold,
            active_permissions: self.active_permission.len() as u32,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawResources {
    #[serde(default, rename = "EnergyUsed")]
    energy_used: u64,
    #[serde(default, rename = "EnergyLimit")]
    energy_limit: u64,
    #[serde(default, rename = "NetUsed")]
    net_used: u64,
    #[serde(default, rename = "NetLimit")]
    net_limit: u64,
    #[serde(default, rename = "freeNetUsed")]
    free_net_used: u64,
    #[serde(default, rename = "freeNetLimit")]
    free_net_limit: u64,
}
