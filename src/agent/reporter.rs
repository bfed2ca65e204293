// src/agent/reporter.rs

//! Fire-and-forget reporting of locally computed results to the backend.

use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::agent::{
    backend::BackendClient,
    protocol::{ToolReport, WalletConnectedReport, WalletDetailsReport, WalletErrorReport},
};
use crate::blockchain::models::{ConnectionInfo, WalletSnapshot};

#[derive(Clone)]
pub struct Reporter {
    backend: BackendClient,
    tracker: TaskTracker,
}

impl Reporter {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            tracker: TaskTracker::new(),
        }
    }

    pub fn wallet_connected(&self, session_id: &str, connection: &ConnectionInfo) {
        self.spawn(
            "/api/wallet/connected",
            WalletConnectedReport {
                session_id: session_id.to_string(),
                address: connection.address.clone(),
                node_host: connection.node_host.clone(),
                network: connection.network.to_string(),
            },
        );
    }

    pub fn wallet_details(&self, session_id: &str, snapshot: &WalletSnapshot) {
        self.spawn(
            "/api/wallet/details",
            WalletDetailsReport {
                session_id: session_id.to_string(),
                address: snapshot.address.clone(),
                trx_balance: format!("{:.6}", snapshot.native_balance),
                extra: json!({
                    "network": snapshot.network,
                    "node_host": snapshot.node_host,
                    "energy": snapshot.energy,
                    "bandwidth": snapshot.bandwidth,
                    "frozen_for_bandwidth": snapshot.frozen_for_bandwidth,
                    "frozen_for_energy": snapshot.frozen_for_energy,
                    "permissions": snapshot.permissions,
                }),
            },
        );
    }

    pub fn error(&self, session_id: &str, error: &str) {
        self.spawn(
            "/api/wallet/error",
            WalletErrorReport {
                session_id: session_id.to_string(),
                error: error.to_string(),
            },
        );
    }

    pub fn tool_result(&self, session_id: &str, tool: &str, result: &Value) {
        self.spawn(
            "/api/tools/report",
            ToolReport {
                session_id: session_id.to_string(),
                result: json!({ "tool": tool, "result": result }),
            },
        );
    }

    /// Stops accepting new reports and waits for the in-flight ones.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn<B>(&self, path: &'static str, body: B)
    where
        B: Serialize + Send + Sync + 'static,
    {
        let backend = self.backend.clone();
        self.tracker.spawn(async move {
            match backend.post(path, &body).await {
                Ok(()) => debug!(path, "report delivered"),
                Err(e) => warn!(path, error = %e, "report failed"),
            }
        });
    }
}
