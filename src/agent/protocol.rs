// src/agent/protocol.rs

//! Wire types exchanged with the chat backend, and the parsed tool-call sum type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

// --- Chat ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    #[serde(default = "default_session_id")]
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub function_calls: Vec<RawToolCall>,
    #[serde(default)]
    pub widget: Option<Value>,
}

/// Tool-call envelope as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default)]
    pub executed: bool,
}

impl RawToolCall {
    pub fn new(tag: impl Into<String>, args: Value) -> Self {
        Self {
            tag: tag.into(),
            args,
            result: None,
            executed: false,
        }
    }

    /// True when the backend already ran this tool, so no local handler should run.
    pub fn is_precomputed(&self) -> bool {
        self.executed || self.result.is_some()
    }
}

// --- Reporting ---

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest<'a> {
    pub session_id: &'a str,
    pub tool: &'a str,
    pub result: &'a Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub widget: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletConnectedReport {
    pub session_id: String,
    pub address: String,
    pub node_host: String,
    pub network: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletDetailsReport {
    pub session_id: String,
    pub address: String,
    pub trx_balance: String,
    pub extra: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletErrorReport {
    pub session_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    pub session_id: String,
    pub result: Value,
}

// --- Tool calls ---

pub const TOOL_CHECK_PROVIDER: &str = "wallet_check_tronlink";
pub const TOOL_CONNECT: &str = "wallet_connect";
pub const TOOL_FETCH_BALANCE: &str = "wallet_fetch_balance";
pub const TOOL_LIST_MARKETS: &str = "trustlender_list_markets";
pub const TOOL_MARKET_DETAIL: &str = "trustlender_market_detail";
pub const TOOL_USER_POSITION: &str = "trustlender_user_position";

/// Tags from the previous wallet tool generation. Recognized so they can be ignored.
pub const LEGACY_TAGS: [&str; 3] = [
    "wallet_info_request",
    "wallet_connection_request",
    "wallet_details_request",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    CheckProvider,
    Connect,
    FetchBalance,
    ListMarkets { limit: Option<usize> },
    MarketDetail { symbol: String },
    UserPosition { address: Option<String> },
    Legacy { tag: String },
    Unknown { tag: String },
    Malformed { tag: String, reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct ListMarketsArgs {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct MarketDetailArgs {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
struct UserPositionArgs {
    #[serde(default)]
    address: Option<String>,
}

impl ToolCall {
    pub fn parse(raw: &RawToolCall) -> Self {
        let tag = raw.tag.as_str();
        match tag {
            TOOL_CHECK_PROVIDER => ToolCall::CheckProvider,
            TOOL_CONNECT => ToolCall::Connect,
            TOOL_FETCH_BALANCE => ToolCall::FetchBalance,
            TOOL_LIST_MARKETS => match parse_args::<ListMarketsArgs>(&raw.args) {
                Ok(args) => ToolCall::ListMarkets { limit: args.limit },
                Err(reason) => malformed(tag, reason),
            },
            TOOL_MARKET_DETAIL => match serde_json::from_value::<MarketDetailArgs>(raw.args.clone())
            {
                Ok(args) if !args.symbol.trim().is_empty() => ToolCall::MarketDetail {
                    symbol: args.symbol.trim().to_string(),
                },
                Ok(_) => malformed(tag, "symbol is empty".to_string()),
                Err(e) => malformed(tag, e.to_string()),
            },
            TOOL_USER_POSITION => match parse_args::<UserPositionArgs>(&raw.args) {
                Ok(args) => ToolCall::UserPosition {
                    address: args.address.filter(|a| !a.trim().is_empty()),
                },
                Err(reason) => malformed(tag, reason),
            },
            t if LEGACY_TAGS.contains(&t) => ToolCall::Legacy { tag: t.to_string() },
            t => ToolCall::Unknown { tag: t.to_string() },
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ToolCall::CheckProvider => TOOL_CHECK_PROVIDER,
            ToolCall::Connect => TOOL_CONNECT,
            ToolCall::FetchBalance => TOOL_FETCH_BALANCE,
            ToolCall::ListMarkets { .. } => TOOL_LIST_MARKETS,
            ToolCall::MarketDetail { .. } => TOOL_MARKET_DETAIL,
            ToolCall::UserPosition { .. } => TOOL_USER_POSITION,
            ToolCall::Legacy { tag } | ToolCall::Unknown { tag } | ToolCall::Malformed { tag, .. } => {
                tag
            }
        }
    }
}

// Missing or null args mean "all defaults".
fn parse_args<T: Default + serde::de::DeserializeOwned>(args: &Value) -> Result<T, String> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args.clone()).map_err(|e| e.to_string())
}

fn malformed(tag: &str, reason: String) -> ToolCall {
    ToolCall::Malformed {
        tag: tag.to_string(),
        reason,
    }
}
