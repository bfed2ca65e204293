// src/blockchain/services/lending.rs

//! Read-only access to JustLend markets.

use std::sync::Arc;
use std::time::Duration;

use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::types::U256;
use tracing::{debug, info, warn};

use crate::blockchain::{
    address::{to_evm_address, to_tron_address},
    models::{
        MarketDetail, MarketDetailResult, MarketListing, MarketPosition, MarketRow, UserPosition,
    },
    provider::{ChainProvider, ProviderSlot},
    services::retry::{with_retries, RetryPolicy},
};
use crate::config::Config;
use crate::error::{AgentError, AgentResult, ProviderError};

/// Blocks produced per year at one block every three seconds.
pub const BLOCKS_PER_YEAR: f64 = 10_512_000.0;

/// Fixed-point scale of protocol rate mantissas.
pub const MANTISSA_SCALE: f64 = 1e18;

/// Converts a mantissa to `f64`. Values beyond `f64` range saturate to infinity.
pub fn mantissa_to_f64(mantissa: &U256) -> f64 {
    mantissa.to_string().parse::<f64>().unwrap_or(f64::INFINITY)
}

/// Annualizes a per-block rate mantissa: `((1 + m / 1e18)^B - 1) * 100`.
pub fn per_block_to_apy(rate_per_block: &U256) -> f64 {
    let r = mantissa_to_f64(rate_per_block) / MANTISSA_SCALE;
    ((1.0 + r).powf(BLOCKS_PER_YEAR) - 1.0) * 100.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct MarketReaderSettings {
    pub network: String,
    pub unitroller: Result<String, String>,
    pub max_markets: usize,
    pub per_market_delay: Duration,
    pub retry: RetryPolicy,
}

impl MarketReaderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            network: config.tron_network.clone(),
            unitroller: config.unitroller(),
            max_markets: config.justlend_max_markets,
            per_market_delay: Duration::from_millis(config.justlend_per_market_delay_ms),
            retry: RetryPolicy {
                max_attempts: config.justlend_max_retries,
                // Backoff starts at a quarter of the configured delay.
                base_delay: Duration::from_millis(config.justlend_retry_delay_ms / 4),
            },
        }
    }
}

#[derive(Clone)]
pub struct MarketReader {
    slot: ProviderSlot,
    settings: MarketReaderSettings,
}

impl MarketReader {
    pub fn new(slot: ProviderSlot, settings: MarketReaderSettings) -> Self {
        Self { slot, settings }
    }

    /// Lists up to `limit` markets. Markets whose reads fail are left out.
    pub async fn list_markets(&self, limit: Option<usize>) -> AgentResult<MarketListing> {
        let limit = limit.unwrap_or(self.settings.max_markets);
        let (provider, unitroller) = self.context().await?;
        let mut addresses = self.all_markets(provider.as_ref(), &unitroller).await?;
        addresses.truncate(limit);
        info!(count = addresses.len(), limit, "reading JustLend markets");

        let mut markets = Vec::with_capacity(addresses.len());
        for (i, market) in addresses.iter().enumerate() {
            self.pace(i).await;
            match self.read_row(provider.as_ref(), market).await {
                Ok(row) => {
                    debug!(symbol = %row.symbol, supply = row.supply_apy_pct, borrow = row.borrow_apy_pct, "market read");
                    markets.push(row);
                }
                Err(e) => warn!(error = %e, "skipping market"),
            }
        }

        info!(read = markets.len(), requested = addresses.len(), "JustLend markets fetched");
        Ok(MarketListing {
            network: self.settings.network.clone(),
            unitroller,
            count: markets.len(),
            requested_limit: limit,
            markets,
        })
    }

    /// Finds a market by symbol (case-insensitive) and reads its full detail.
    pub async fn market_detail(&self, symbol: &str) -> AgentResult<MarketDetailResult> {
        let (provider, unitroller) = self.context().await?;
        let provider = provider.as_ref();
        let addresses = self.all_markets(provider, &unitroller).await?;

        for (i, market) in addresses.iter().enumerate() {
            self.pace(i).await;
            let found = match self.read_symbol(provider, market).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(%market, error = %e, "symbol read failed, skipping");
                    continue;
                }
            };
            if !found.eq_ignore_ascii_case(symbol) {
                continue;
            }

            let detail = self
                .read_detail(provider, &unitroller, market, found)
                .await
                .map_err(|e| AgentError::PerMarketReadFailure {
                    market: market.clone(),
                    reason: e.to_string(),
                })?;
            info!(symbol = %detail.row.symbol, "market detail fetched");
            return Ok(MarketDetailResult {
                network: self.settings.network.clone(),
                unitroller,
                market: detail,
            });
        }

        Err(AgentError::MarketNotFound {
            symbol: symbol.to_string(),
            network: self.settings.network.clone(),
        })
    }

    /// Reads an account's supply/borrow balances in every market plus its liquidity.
    pub async fn user_position(&self, account: &str) -> AgentResult<UserPosition> {
        let (provider, unitroller) = self.context().await?;
        let provider = provider.as_ref();
        let account_token = Token::Address(to_evm_address(account)?);
        let addresses = self.all_markets(provider, &unitroller).await?;

        let mut positions = Vec::new();
        for (i, market) in addresses.iter().enumerate() {
            self.pace(i).await;
            match self.read_position(provider, market, &account_token).await {
                Ok(position) => positions.push(position),
                Err(e) => warn!(%market, error = %e, "position read failed, skipping"),
            }
        }

        let liquidity = self
            .read(
                provider,
                &unitroller,
                "getAccountLiquidity(address)",
                &[account_token],
                &[ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(256)],
            )
            .await?;

        info!(%account, positions = positions.len(), "user position fetched");
        Ok(UserPosition {
            network: self.settings.network.clone(),
            address: account.to_string(),
            positions,
            liquidity_mantissa: uint_at(&liquidity, 1)?.to_string(),
            shortfall_mantissa: uint_at(&liquidity, 2)?.to_string(),
        })
    }

    async fn context(&self) -> AgentResult<(Arc<dyn ChainProvider>, String)> {
        let unitroller = self.settings.unitroller.clone().map_err(AgentError::Config)?;
        let provider = self.slot.current().await.ok_or_else(|| {
            AgentError::ProviderUnavailable("no provider injected".to_string())
        })?;
        Ok((provider, unitroller))
    }

    async fn pace(&self, index: usize) {
        if index > 0 && !self.settings.per_market_delay.is_zero() {
            tokio::time::sleep(self.settings.per_market_delay).await;
        }
    }

    async fn all_markets(
        &self,
        provider: &dyn ChainProvider,
        unitroller: &str,
    ) -> AgentResult<Vec<String>> {
        let tokens = self
            .read(
                provider,
                unitroller,
                "getAllMarkets()",
                &[],
                &[ParamType::Array(Box::new(ParamType::Address))],
            )
            .await?;
        match tokens.into_iter().next() {
            Some(Token::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|t| t.into_address())
                .map(|a| to_tron_address(&a))
                .collect()),
            other => Err(AgentError::ProviderUnavailable(format!(
                "unexpected getAllMarkets result: {:?}",
                other
            ))),
        }
    }

    async fn read_row(
        &self,
        provider: &dyn ChainProvider,
        market: &str,
    ) -> Result<MarketRow, AgentError> {
        let per_market = |e: ProviderError| AgentError::PerMarketReadFailure {
            market: market.to_string(),
            reason: e.to_string(),
        };
        let symbol = self.read_symbol(provider, market).await.map_err(per_market)?;
        let supply = self
            .read_uint(provider, market, "supplyRatePerBlock()")
            .await
            .map_err(per_market)?;
        let borrow = self
            .read_uint(provider, market, "borrowRatePerBlock()")
            .await
            .map_err(per_market)?;
        Ok(MarketRow {
            address: market.to_string(),
            symbol,
            supply_apy_pct: round2(per_block_to_apy(&supply)),
            borrow_apy_pct: round2(per_block_to_apy(&borrow)),
        })
    }

    async fn read_detail(
        &self,
        provider: &dyn ChainProvider,
        unitroller: &str,
        market: &str,
        symbol: String,
    ) -> Result<MarketDetail, ProviderError> {
        let supply = self.read_uint(provider, market, "supplyRatePerBlock()").await?;
        let borrow = self.read_uint(provider, market, "borrowRatePerBlock()").await?;
        let exchange = self.read_uint(provider, market, "exchangeRateStored()").await?;
        let total_borrows = self.read_uint(provider, market, "totalBorrows()").await?;
        let listing = self
            .read(
                provider,
                unitroller,
                "markets(address)",
                &[Token::Address(to_evm_address(market)?)],
                &[ParamType::Bool, ParamType::Uint(256), ParamType::Bool],
            )
            .await?;
        let collateral_factor = uint_at(&listing, 1)?;

        Ok(MarketDetail {
            row: MarketRow {
                address: market.to_string(),
                symbol,
                supply_apy_pct: round2(per_block_to_apy(&supply)),
                borrow_apy_pct: round2(per_block_to_apy(&borrow)),
            },
            collateral_factor_pct: mantissa_to_f64(&collateral_factor) / 1e16,
            supply_rate_per_block: supply.to_string(),
            borrow_rate_per_block: borrow.to_string(),
            exchange_rate_mantissa: exchange.to_string(),
            total_borrows_mantissa: total_borrows.to_string(),
        })
    }

    async fn read_position(
        &self,
        provider: &dyn ChainProvider,
        market: &str,
        account: &Token,
    ) -> Result<MarketPosition, ProviderError> {
        let symbol = self.read_symbol(provider, market).await?;
        let snapshot = self
            .read(
                provider,
                market,
                "getAccountSnapshot(address)",
                std::slice::from_ref(account),
                &vec![ParamType::Uint(256); 4],
            )
            .await?;
        Ok(MarketPosition {
            jtoken: market.to_string(),
            symbol,
            token_balance_mantissa: uint_at(&snapshot, 1)?.to_string(),
            borrow_balance_mantissa: uint_at(&snapshot, 2)?.to_string(),
            exchange_rate_mantissa: uint_at(&snapshot, 3)?.to_string(),
        })
    }

    async fn read_symbol(
        &self,
        provider: &dyn ChainProvider,
        market: &str,
    ) -> Result<String, ProviderError> {
        let label = format!("symbol({})", market);
        with_retries(&label, &self.settings.retry, || async move {
            let raw = provider.call_read_only(market, "symbol()", &[]).await?;
            decode_symbol(&raw)
        })
        .await
    }

    async fn read_uint(
        &self,
        provider: &dyn ChainProvider,
        contract: &str,
        signature: &str,
    ) -> Result<U256, ProviderError> {
        let tokens = self
            .read(provider, contract, signature, &[], &[ParamType::Uint(256)])
            .await?;
        uint_at(&tokens, 0)
    }

    async fn read(
        &self,
        provider: &dyn ChainProvider,
        contract: &str,
        signature: &str,
        args: &[Token],
        outputs: &[ParamType],
    ) -> Result<Vec<Token>, ProviderError> {
        let label = format!("{}@{}", signature, contract);
        with_retries(&label, &self.settings.retry, || async move {
            let raw = provider.call_read_only(contract, signature, args).await?;
            decode(outputs, &raw).map_err(|e| ProviderError::Decode(format!("{}: {}", signature, e)))
        })
        .await
    }
}

// Some tokens return `bytes32` instead of `string` from `symbol()`.
fn decode_symbol(raw: &[u8]) -> Result<String, ProviderError> {
    if let Ok(tokens) = decode(&[ParamType::String], raw) {
        if let Some(Token::String(s)) = tokens.into_iter().next() {
            return Ok(s);
        }
    }
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], raw) {
        if let Some(Token::FixedBytes(bytes)) = tokens.into_iter().next() {
            let trimmed: Vec<u8> = bytes.into_iter().take_while(|b| *b != 0).collect();
            if let Ok(s) = String::from_utf8(trimmed) {
                return Ok(s);
            }
        }
    }
    Err(ProviderError::Decode("symbol() returned undecodable data".to_string()))
}

fn uint_at(tokens: &[Token], index: usize) -> Result<U256, ProviderError> {
    match tokens.get(index) {
        Some(Token::Uint(value)) => Ok(*value),
        other => Err(ProviderError::Decode(format!(
            "expected uint at position {}, found {:?}",
            index, other
        ))),
    }
}
