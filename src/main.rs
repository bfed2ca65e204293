// src/main.rs

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use slate_agent::{
    agent::session::{Role, Session},
    api,
    blockchain::{provider::ProviderSlot, trongrid::TronGridProvider},
    config::Config,
    utils::{mode_enabled, short_address},
    AppState,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> anyhow::Result<()> {
    // Create the main app with the API router under /api
    let app = Router::new()
        .nest("/api", api::router())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    info!("🚀 HTTP Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

// --- REPL Logic ---
async fn run_repl(state: AppState) -> anyhow::Result<()> {
    info!("🚀 Starting REPL on stdin/stdout...");

    let mut stdin = io::BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut session = Session::new(state.config.session_id.clone());

    loop {
        let mut line = String::new();

        match stdin.read_line(&mut line).await {
            Ok(0) => {
                info!("EOF received, shutting down REPL");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" || line == "/exit" {
                    break;
                }

                debug!("Received: {}", line);
                let lines = state.agent.handle_message(&mut session, line).await;

                let mut out = String::new();
                for chat_line in lines.iter().filter(|l| l.role != Role::User) {
                    out.push_str(&format!("{}\n", chat_line.text));
                }
                out.push_str(&format!("{}\n", session.widget.render_text()));
                stdout
                    .write_all(out.as_bytes())
                    .await
                    .context("failed to write to stdout")?;
                stdout.flush().await.context("failed to flush stdout")?;
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        }
    }

    info!("REPL shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slate_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env().context("❌ Failed to load configuration")?;

    // Inject the node-backed provider
    let provider = TronGridProvider::from_config(&config)
        .context("❌ Failed to initialize TRON node provider")?;
    match &config.wallet_address {
        Some(address) => info!(
            account = %short_address(address),
            node = %config.tron_node_url,
            "provider injected"
        ),
        None => info!(node = %config.tron_node_url, "provider injected without an account"),
    }
    let slot = ProviderSlot::with_provider(Arc::new(provider));

    let state = AppState::new(config, slot).context("❌ Failed to build application state")?;

    // Check if running as a REPL (stdin/stdout) or HTTP server
    let args: Vec<String> = env::args().collect();
    let result = if mode_enabled(&args, "--repl", "REPL_MODE") {
        run_repl(state.clone()).await
    } else {
        run_http_server(state.clone()).await
    };

    // Let pending reports reach the backend before exiting
    state.reporter().drain().await;
    result
}
