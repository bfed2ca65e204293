// src/config.rs

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::agent::session::DEFAULT_MAX_SESSIONS;
use crate::blockchain::models::Network;

/// JustLend unitroller on TRON mainnet.
pub const DEFAULT_MAINNET_UNITROLLER: &str = "TGjYzgCyPobsNS9n6WcbdLVR9dH7mWqFx7";

const MAINNET_NODE_URL: &str = "https://api.trongrid.io";
const NILE_NODE_URL: &str = "https://nile.trongrid.io";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // Chat backend
    pub backend_url: String,
    pub session_id: String,
    /// Live chat sessions kept in memory before the least recently used is dropped.
    pub max_sessions: usize,

    /// TRON network the node provider talks to ("mainnet" or "nile").
    pub tron_network: String,
    pub tron_node_url: String,
    pub trongrid_api_key: Option<String>,
    /// Account the node provider exposes once access is granted.
    pub wallet_address: Option<String>,
    /// When set, `connect` fails with `WrongNetwork` on any other network.
    pub required_network: Option<Network>,

    // Connector polling
    pub connect_timeout_ms: u64,
    pub connect_poll_interval_ms: u64,

    // JustLend settings
    pub jl_unitroller_main: String,
    pub jl_unitroller_nile: Option<String>,
    pub justlend_max_markets: usize,
    pub justlend_per_market_delay_ms: u64,
    pub justlend_retry_delay_ms: u64,
    pub justlend_max_retries: u32,

    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            backend_url: "http://127.0.0.1:8000".to_string(),
            session_id: "default".to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            tron_network: "mainnet".to_string(),
            tron_node_url: MAINNET_NODE_URL.to_string(),
            trongrid_api_key: None,
            wallet_address: None,
            required_network: None,
            connect_timeout_ms: 8_000,
            connect_poll_interval_ms: 150,
            jl_unitroller_main: DEFAULT_MAINNET_UNITROLLER.to_string(),
            jl_unitroller_nile: None,
            justlend_max_markets: 4,
            justlend_per_market_delay_ms: 1_000,
            justlend_retry_delay_ms: 2_000,
            justlend_max_retries: 1,
            http_timeout_secs: 20,
        }
    }
}

impl Config {
    /// Resolves the JustLend comptroller address for the configured network.
    pub fn unitroller(&self) -> Result<String, String> {
        if self.tron_network == "mainnet" {
            return Ok(self.jl_unitroller_main.clone());
        }
        self.jl_unitroller_nile.clone().ok_or_else(|| {
            format!(
                "JL_UNITROLLER_NILE is required when TRON_NETWORK={}",
                self.tron_network
            )
        })
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let tron_network = env::var("TRON_NETWORK")
            .unwrap_or_else(|_| defaults.tron_network.clone())
            .to_lowercase();

        let tron_node_url = env::var("TRON_NODE_URL").unwrap_or_else(|_| {
            if tron_network == "mainnet" {
                MAINNET_NODE_URL.to_string()
            } else {
                NILE_NODE_URL.to_string()
            }
        });
        url::Url::parse(&tron_node_url).context("TRON_NODE_URL must be a valid URL")?;

        let backend_url = env::var("BACKEND_URL").unwrap_or(defaults.backend_url);
        url::Url::parse(&backend_url).context("BACKEND_URL must be a valid URL")?;

        let required_network = match env::var("REQUIRED_NETWORK") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Network::from_str(&raw)
                    .map_err(anyhow::Error::msg)
                    .context("REQUIRED_NETWORK must be 'mainnet' or 'nile'")?,
            ),
            _ => None,
        };

        Ok(Config {
            port: parse_var("PORT", defaults.port)?,
            backend_url,
            session_id: env::var("SESSION_ID")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string()),
            max_sessions: parse_var("MAX_SESSIONS", defaults.max_sessions)?,
            tron_network,
            tron_node_url,
            trongrid_api_key: env::var("TRONGRID_API_KEY").ok().filter(|k| !k.is_empty()),
            wallet_address: env::var("WALLET_ADDRESS").ok().filter(|a| !a.is_empty()),
            required_network,
            connect_timeout_ms: parse_var("CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms)?,
            connect_poll_interval_ms: parse_var(
                "CONNECT_POLL_INTERVAL_MS",
                defaults.connect_poll_interval_ms,
            )?,
            jl_unitroller_main: env::var("JL_UNITROLLER_MAIN")
                .unwrap_or(defaults.jl_unitroller_main),
            jl_unitroller_nile: env::var("JL_UNITROLLER_NILE").ok().filter(|a| !a.is_empty()),
            justlend_max_markets: parse_var("JUSTLEND_MAX_MARKETS", defaults.justlend_max_markets)?,
            justlend_per_market_delay_ms: parse_var(
                "JUSTLEND_PER_MARKET_DELAY_MS",
                defaults.justlend_per_market_delay_ms,
            )?,
            justlend_retry_delay_ms: parse_var(
                "JUSTLEND_RETRY_DELAY_MS",
                defaults.justlend_retry_delay_ms,
            )?,
            justlend_max_retries: parse_var("JUSTLEND_MAX_RETRIES", defaults.justlend_max_retries)?,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_uses_default_unitroller() {
        let config = Config::default();
        assert_eq!(config.unitroller().unwrap(), DEFAULT_MAINNET_UNITROLLER);
    }

    #[test]
    fn nile_requires_explicit_unitroller() {
        let mut config = Config {
            tron_network: "nile".to_string(),
            ..Config::default()
        };
        assert!(config.unitroller().unwrap_err().contains("JL_UNITROLLER_NILE"));

        config.jl_unitroller_nile = Some("TXnileUnitroller".to_string());
        assert_eq!(config.unitroller().unwrap(), "TXnileUnitroller");
    }
}
