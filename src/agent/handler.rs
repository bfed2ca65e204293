// src/agent/handler.rs

//! Executes the tool calls of one chat turn.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::agent::{
    protocol::{RawToolCall, ToolCall},
    reporter::Reporter,
    widget::{JustlendView, WalletView, Widget},
};
use crate::blockchain::{
    models::{
        ConnectionInfo, MarketDetailResult, MarketListing, ProviderStatus, UserPosition,
        WalletSnapshot,
    },
    services::{connector::WalletConnector, lending::MarketReader, snapshot::SnapshotBuilder},
};
use crate::error::{AgentError, AgentResult};

/// A tool that ran locally during the turn, with the result that was reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedTool {
    pub tool: String,
    pub result: Value,
}

/// What a batch of tool calls did to the turn.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// `None` when no call touched the widget.
    pub widget: Option<Widget>,
    pub lines: Vec<String>,
    pub executed: Vec<ExecutedTool>,
}

// Result of one successful local handler.
struct Handled {
    widget: Widget,
    result: Value,
    lines: Vec<String>,
}

#[derive(Clone)]
pub struct Dispatcher {
    connector: WalletConnector,
    snapshots: SnapshotBuilder,
    markets: MarketReader,
    reporter: Reporter,
}

impl Dispatcher {
    pub fn new(
        connector: WalletConnector,
        snapshots: SnapshotBuilder,
        markets: MarketReader,
        reporter: Reporter,
    ) -> Self {
        Self {
            connector,
            snapshots,
            markets,
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Runs the calls in order. Each handled call replaces the widget set by the previous one.
    pub async fn run_batch(&self, session_id: &str, calls: &[RawToolCall]) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();

        for raw in calls {
            let call = ToolCall::parse(raw);
            match &call {
                ToolCall::Legacy { tag } => {
                    info!(%tag, "ignoring superseded wallet tool");
                    continue;
                }
                ToolCall::Unknown { tag } => {
                    warn!(%tag, "ignoring unknown tool");
                    continue;
                }
                ToolCall::Malformed { tag, reason } => {
                    warn!(%tag, %reason, "ignoring malformed tool call");
                    continue;
                }
                _ => {}
            }

            if raw.is_precomputed() {
                if let Some(result) = &raw.result {
                    debug!(tool = call.tag(), "using backend result");
                    let (widget, lines) = precomputed_view(&call, result);
                    outcome.widget = Some(widget);
                    outcome.lines.extend(lines);
                } else {
                    debug!(tool = call.tag(), "backend already executed tool");
                }
                continue;
            }

            match self.execute(session_id, &call).await {
                Ok(handled) => {
                    self.reporter.tool_result(session_id, call.tag(), &handled.result);
                    outcome.widget = Some(handled.widget);
                    outcome.lines.extend(handled.lines);
                    outcome.executed.push(ExecutedTool {
                        tool: call.tag().to_string(),
                        result: handled.result,
                    });
                }
                Err(e) => {
                    error!(tool = call.tag(), kind = e.kind(), error = %e, "tool failed");
                    self.reporter.error(session_id, &format!("{}: {}", e.kind(), e));
                    outcome.widget = Some(Widget::Idle);
                    outcome.lines.push(failure_line(&e));
                }
            }
        }

        outcome
    }

    async fn execute(&self, session_id: &str, call: &ToolCall) -> AgentResult<Handled> {
        match call {
            ToolCall::CheckProvider => {
                let status = self.connector.check_provider().await;
                let line = if !status.present {
                    "TronLink not detected.".to_string()
                } else if let Some(address) = &status.address {
                    format!("TronLink detected, account {} available.", address)
                } else {
                    "TronLink detected but locked.".to_string()
                };
                Ok(Handled {
                    result: to_value(&status),
                    widget: status_widget(status),
                    lines: vec![line],
                })
            }
            ToolCall::Connect => {
                let connection = self.connect(session_id).await?;
                Ok(Handled {
                    result: to_value(&connection),
                    lines: vec![connected_line(&connection)],
                    widget: Widget::Wallet(WalletView::Connection(connection)),
                })
            }
            ToolCall::FetchBalance => {
                let connection = self.connect(session_id).await?;
                let snapshot = self.snapshots.snapshot(&connection).await?;
                self.reporter.wallet_details(session_id, &snapshot);
                Ok(Handled {
                    result: to_value(&snapshot),
                    lines: vec![format!(
                        "balance of {}: {:.6} TRX.",
                        snapshot.address, snapshot.native_balance
                    )],
                    widget: Widget::Wallet(WalletView::Snapshot(snapshot)),
                })
            }
            ToolCall::ListMarkets { limit } => {
                let listing = self.markets.list_markets(*limit).await?;
                Ok(Handled {
                    result: to_value(&listing),
                    lines: vec![found_markets_line(listing.markets.len())],
                    widget: listing_widget(listing),
                })
            }
            ToolCall::MarketDetail { symbol } => {
                let detail = self.markets.market_detail(symbol).await?;
                Ok(Handled {
                    result: to_value(&detail),
                    lines: vec![format!(
                        "{}: supply {:.2}%, borrow {:.2}%.",
                        detail.market.row.symbol,
                        detail.market.row.supply_apy_pct,
                        detail.market.row.borrow_apy_pct
                    )],
                    widget: Widget::Justlend(JustlendView::Detail(detail)),
                })
            }
            ToolCall::UserPosition { address } => {
                let address = match address {
                    Some(address) => address.clone(),
                    None => self.connect(session_id).await?.address,
                };
                let position = self.markets.user_position(&address).await?;
                let active = position.positions.iter().filter(|p| p.is_active()).count();
                Ok(Handled {
                    result: to_value(&position),
                    lines: vec![format!(
                        "{} has {} active JustLend positions.",
                        position.address, active
                    )],
                    widget: Widget::Justlend(JustlendView::User(position)),
                })
            }
            ToolCall::Legacy { tag } | ToolCall::Unknown { tag } | ToolCall::Malformed { tag, .. } => {
                Err(AgentError::Config(format!("no handler for tool {}", tag)))
            }
        }
    }

    async fn connect(&self, session_id: &str) -> AgentResult<ConnectionInfo> {
        let connection = self.connector.connect().await?;
        self.reporter.wallet_connected(session_id, &connection);
        Ok(connection)
    }
}

// Turns a backend-attached result into the widget and lines the local handler would produce.
fn precomputed_view(call: &ToolCall, result: &Value) -> (Widget, Vec<String>) {
    let parsed = match call {
        ToolCall::CheckProvider => {
            parse_result::<ProviderStatus>(result).map(|s| (status_widget(s), vec![]))
        }
        ToolCall::Connect => parse_result::<ConnectionInfo>(result).map(|c| {
            let line = connected_line(&c);
            (Widget::Wallet(WalletView::Connection(c)), vec![line])
        }),
        ToolCall::FetchBalance => parse_result::<WalletSnapshot>(result)
            .map(|s| (Widget::Wallet(WalletView::Snapshot(s)), vec![])),
        ToolCall::ListMarkets { .. } => parse_result::<MarketListing>(result).map(|listing| {
            let line = found_markets_line(listing.markets.len());
            (listing_widget(listing), vec![line])
        }),
        ToolCall::MarketDetail { .. } => parse_result::<MarketDetailResult>(result)
            .map(|d| (Widget::Justlend(JustlendView::Detail(d)), vec![])),
        ToolCall::UserPosition { .. } => parse_result::<UserPosition>(result)
            .map(|u| (Widget::Justlend(JustlendView::User(u)), vec![])),
        ToolCall::Legacy { .. } | ToolCall::Unknown { .. } | ToolCall::Malformed { .. } => {
            Err("no view for tool".to_string())
        }
    };

    parsed.unwrap_or_else(|reason| {
        warn!(tool = call.tag(), %reason, "backend result has an unexpected shape");
        (Widget::Idle, vec![])
    })
}

// The status view is only shown for a provider that is present and ready.
fn status_widget(status: ProviderStatus) -> Widget {
    if status.present && status.ready {
        Widget::Wallet(WalletView::Status(status))
    } else {
        Widget::Idle
    }
}

fn listing_widget(listing: MarketListing) -> Widget {
    if listing.markets.is_empty() {
        Widget::Idle
    } else {
        Widget::Justlend(JustlendView::List(listing))
    }
}

fn parse_result<T: DeserializeOwned>(result: &Value) -> Result<T, String> {
    if let Some(message) = result.get("error").and_then(Value::as_str) {
        return Err(format!("backend reported error: {}", message));
    }
    serde_json::from_value(result.clone()).map_err(|e| e.to_string())
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn connected_line(connection: &ConnectionInfo) -> String {
    format!(
        "connected {} on {}.",
        connection.address, connection.network
    )
}

fn found_markets_line(count: usize) -> String {
    format!("found {} markets.", count)
}

fn failure_line(err: &AgentError) -> String {
    match err {
        AgentError::ProviderMissing => {
            "TronLink not found. Install or unlock it, then try again.".to_string()
        }
        AgentError::NoAccount => "TronLink is locked or access was rejected.".to_string(),
        AgentError::WrongNetwork { expected, actual } => {
            format!("wallet is on {}, switch it to {}.", actual, expected)
        }
        other => format!("something went wrong: {}", other),
    }
}
