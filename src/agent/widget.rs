// src/agent/widget.rs

use serde::{Deserialize, Serialize};

use crate::blockchain::models::{
    ConnectionInfo, MarketDetailResult, MarketListing, ProviderStatus, UserPosition,
    WalletSnapshot,
};

/// Terminal UI state of a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Widget {
    #[default]
    Idle,
    Wallet(WalletView),
    Justlend(JustlendView),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum WalletView {
    Status(ProviderStatus),
    Connection(ConnectionInfo),
    Snapshot(WalletSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum JustlendView {
    List(MarketListing),
    Detail(MarketDetailResult),
    User(UserPosition),
}

impl Widget {
    pub fn is_idle(&self) -> bool {
        matches!(self, Widget::Idle)
    }

    /// Plain-text rendering for the REPL.
    pub fn render_text(&self) -> String {
        match self {
            Widget::Idle => "[idle]".to_string(),
            Widget::Wallet(WalletView::Status(status)) => format!(
                "[wallet status] present={} ready={} address={}",
                status.present,
                status.ready,
                status.address.as_deref().unwrap_or("-")
            ),
            Widget::Wallet(WalletView::Connection(conn)) => format!(
                "[wallet] {} on {} ({})",
                conn.address, conn.network, conn.node_host
            ),
            Widget::Wallet(WalletView::Snapshot(snap)) => format!(
                "[wallet] {} {:.6} TRX | energy {}/{} | bandwidth {}/{} (free {}/{}) | frozen bw {:.6} en {:.6}",
                snap.address,
                snap.native_balance,
                snap.energy.used,
                snap.energy.limit,
                snap.bandwidth.used,
                snap.bandwidth.limit,
                snap.bandwidth.free_used,
                snap.bandwidth.free_limit,
                snap.frozen_for_bandwidth,
                snap.frozen_for_energy,
            ),
            Widget::Justlend(JustlendView::List(listing)) => {
                let mut out = format!("[justlend] {} markets", listing.markets.len());
                for row in &listing.markets {
                    out.push_str(&format!(
                        "\n  {:<8} supply {:>7.2}%  borrow {:>7.2}%",
                        row.symbol, row.supply_apy_pct, row.borrow_apy_pct
                    ));
                }
                out
            }
            Widget::Justlend(JustlendView::Detail(detail)) => {
                let m = &detail.market;
                format!(
                    "[justlend] {} supply {:.2}% borrow {:.2}% collateral {:.2}%",
                    m.row.symbol, m.row.supply_apy_pct, m.row.borrow_apy_pct, m.collateral_factor_pct
                )
            }
            Widget::Justlend(JustlendView::User(user)) => {
                let active: Vec<&str> = user
                    .positions
                    .iter()
                    .filter(|p| p.is_active())
                    .map(|p| p.symbol.as_str())
                    .collect();
                format!(
                    "[justlend] {} active in [{}] liquidity {} shortfall {}",
                    user.address,
                    active.join(", "),
                    user.liquidity_mantissa,
                    user.shortfall_mantissa
                )
            }
        }
    }
}
