//! Shared fixtures: an in-memory chain provider and a JustLend deployment on top of it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, U256};

use slate_agent::{
    blockchain::{
        address::to_tron_address,
        models::{AccountInfo, AccountResources},
        provider::ChainProvider,
    },
    config::{Config, DEFAULT_MAINNET_UNITROLLER},
    error::ProviderError,
};

pub const ALICE: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

/// Per-block rate that annualizes to ~171.83%.
pub const E_MINUS_ONE_RATE: u64 = 95_129_375_951;

pub struct FakeProvider {
    address: Mutex<Option<String>>,
    address_after_access: Option<String>,
    grant_access: bool,
    node_host: String,
    balance: Result<u64, ProviderError>,
    account: Result<AccountInfo, ProviderError>,
    resources: Result<AccountResources, ProviderError>,
    calls: HashMap<(String, String), Result<Vec<u8>, ProviderError>>,
}

impl FakeProvider {
    /// An unlocked provider on mainnet exposing `ALICE`.
    pub fn unlocked() -> Self {
        Self {
            address: Mutex::new(Some(ALICE.to_string())),
            address_after_access: None,
            grant_access: true,
            node_host: "api.trongrid.io".to_string(),
            balance: Ok(0),
            account: Ok(AccountInfo::default()),
            resources: Ok(AccountResources::default()),
            calls: HashMap::new(),
        }
    }

    /// A provider that exposes no account until access is granted.
    pub fn locked() -> Self {
        Self {
            address: Mutex::new(None),
            ..Self::unlocked()
        }
    }

    pub fn on_host(mut self, host: &str) -> Self {
        self.node_host = host.to_string();
        self
    }

    pub fn denying_access(mut self) -> Self {
        self.grant_access = false;
        self
    }

    pub fn revealing_on_access(mut self, address: &str) -> Self {
        self.address_after_access = Some(address.to_string());
        self
    }

    pub fn with_balance(mut self, balance: Result<u64, ProviderError>) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_account(mut self, account: Result<AccountInfo, ProviderError>) -> Self {
        self.account = account;
        self
    }

    pub fn with_resources(mut self, resources: Result<AccountResources, ProviderError>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_call(
        mut self,
        contract: &str,
        signature: &str,
        result: Result<Vec<u8>, ProviderError>,
    ) -> Self {
        self.calls
            .insert((contract.to_string(), signature.to_string()), result);
        self
    }

    /// Installs a unitroller listing `markets` plus the per-market reads for each.
    pub fn with_markets(mut self, markets: &[FakeMarket]) -> Self {
        let listed = Token::Array(
            markets
                .iter()
                .map(|m| Token::Address(m.evm_address()))
                .collect(),
        );
        self = self.with_call(
            DEFAULT_MAINNET_UNITROLLER,
            "getAllMarkets()",
            Ok(encode(&[listed])),
        );
        for market in markets {
            self = market.install(self);
        }
        self
    }
}

#[async_trait]
impl ChainProvider for FakeProvider {
    fn ready(&self) -> bool {
        self.address.lock().unwrap().is_some()
    }

    fn selected_address(&self) -> Option<String> {
        self.address.lock().unwrap().clone()
    }

    fn node_host(&self) -> String {
        self.node_host.clone()
    }

    async fn request_access(&self) -> Result<(), ProviderError> {
        if !self.grant_access {
            return Err(ProviderError::AccessDenied);
        }
        if let Some(address) = &self.address_after_access {
            *self.address.lock().unwrap() = Some(address.clone());
        }
        Ok(())
    }

    async fn get_balance(&self, _address: &str) -> Result<u64, ProviderError> {
        self.balance.clone()
    }

    async fn get_account(&self, _address: &str) -> Result<AccountInfo, ProviderError> {
        self.account.clone()
    }

    async fn get_account_resources(
        &self,
        _address: &str,
    ) -> Result<AccountResources, ProviderError> {
        self.resources.clone()
    }

    async fn call_read_only(
        &self,
        contract: &str,
        function_signature: &str,
        _args: &[Token],
    ) -> Result<Vec<u8>, ProviderError> {
        self.calls
            .get(&(contract.to_string(), function_signature.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::Rpc(format!(
                    "no contract answers {} at {}",
                    function_signature, contract
                )))
            })
    }
}

/// One jToken market with fixed reads.
#[derive(Clone)]
pub struct FakeMarket {
    pub id: u64,
    pub symbol: String,
    pub supply_rate: u64,
    pub borrow_rate: u64,
    /// When set, `symbol()` fails on this market.
    pub broken: bool,
}

impl FakeMarket {
    pub fn new(id: u64, symbol: &str, supply_rate: u64, borrow_rate: u64) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            supply_rate,
            borrow_rate,
            broken: false,
        }
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn evm_address(&self) -> Address {
        Address::from_low_u64_be(0x1000 + self.id)
    }

    pub fn address(&self) -> String {
        to_tron_address(&self.evm_address())
    }

    fn install(&self, provider: FakeProvider) -> FakeProvider {
        let address = self.address();
        let symbol = if self.broken {
            Err(ProviderError::Rpc("REVERT opcode executed".to_string()))
        } else {
            Ok(encode(&[Token::String(self.symbol.clone())]))
        };
        provider
            .with_call(&address, "symbol()", symbol)
            .with_call(&address, "supplyRatePerBlock()", Ok(uint(self.supply_rate)))
            .with_call(&address, "borrowRatePerBlock()", Ok(uint(self.borrow_rate)))
            .with_call(&address, "exchangeRateStored()", Ok(uint(200_000_000_000_000_000)))
            .with_call(&address, "totalBorrows()", Ok(uint(42)))
            .with_call(
                &address,
                "getAccountSnapshot(address)",
                Ok(encode(&[
                    Token::Uint(U256::zero()),
                    Token::Uint(U256::from(self.id * 100)),
                    Token::Uint(U256::zero()),
                    Token::Uint(U256::from(200_000_000_000_000_000u64)),
                ])),
            )
            .with_call(
                DEFAULT_MAINNET_UNITROLLER,
                "markets(address)",
                Ok(encode(&[
                    Token::Bool(true),
                    Token::Uint(U256::from(750_000_000_000_000_000u64)),
                    Token::Bool(false),
                ])),
            )
            .with_call(
                DEFAULT_MAINNET_UNITROLLER,
                "getAccountLiquidity(address)",
                Ok(encode(&[
                    Token::Uint(U256::zero()),
                    Token::Uint(U256::from(1_234u64)),
                    Token::Uint(U256::zero()),
                ])),
            )
    }
}

pub fn uint(value: u64) -> Vec<u8> {
    encode(&[Token::Uint(U256::from(value))])
}

/// Config with fast polling and no pacing, talking to `backend_url`.
pub fn test_config(backend_url: &str) -> Config {
    Config {
        backend_url: backend_url.to_string(),
        session_id: "test-session".to_string(),
        connect_timeout_ms: 200,
        connect_poll_interval_ms: 10,
        justlend_per_market_delay_ms: 0,
        justlend_retry_delay_ms: 0,
        http_timeout_secs: 5,
        ..Config::default()
    }
}

/// A backend address nothing listens on.
pub const DEAD_BACKEND: &str = "http://127.0.0.1:9";
