//! Dashboard Core Binary
//!
//! Starts the headless dashboard core: market data session, account snapshot
//! poller, and calculator worker.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p dashboard-core
//! ```
//!
//! # Environment Variables
//!
//! ## Credentials (one source required for account polling)
//! - `DASHBOARD_API_KEY` / `DASHBOARD_API_SECRET`: API credential pair;
//!   falls back to the credential store file when unset
//!
//! ## Optional
//! - `DASHBOARD_WS_URL`: Stream endpoint (default: testnet)
//! - `DASHBOARD_REST_URL`: REST endpoint (default: testnet)
//! - `DASHBOARD_POLL_INTERVAL_SECS`: Snapshot poll interval (default: 30)
//! - `DASHBOARD_ASSETS`: Comma-separated asset allow-list
//! - `DASHBOARD_STORE_DIR`: Directory for mirror files (default: .dashboard)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use dashboard_core::application::SnapshotPoller;
use dashboard_core::infrastructure::binance::{
    BinanceRestClient, MarketSession, SessionEvent,
};
use dashboard_core::infrastructure::config::{Credentials, Settings};
use dashboard_core::infrastructure::persistence::{CredentialStore, TradeStore};
use dashboard_core::infrastructure::telemetry;
use dashboard_core::domain::market::MarketStore;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting dashboard core");

    let settings = Settings::from_env();
    tracing::info!(
        ws_url = %settings.ws_url,
        rest_url = %settings.rest_url,
        poll_interval_secs = settings.poll_interval.as_secs(),
        assets = ?settings.allowed_assets,
        "Configuration loaded"
    );

    let shutdown_token = CancellationToken::new();

    // Market store, rehydrated from the durable trade mirror when present.
    let store = Arc::new(MarketStore::new());
    let mirror = TradeStore::new(&settings.store_dir);
    match mirror.load() {
        Ok(Some(history)) => {
            store.load_trade_history(history);
            tracing::info!("trade history rehydrated from mirror");
        }
        Ok(None) => tracing::info!("no trade mirror found, starting cold"),
        Err(e) => tracing::warn!(error = %e, "trade mirror unreadable, starting cold"),
    }

    // Market data session over the nine public streams.
    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>(64);
    let session = MarketSession::new(
        settings.ws_url.clone(),
        Arc::clone(&store),
        Some(mirror),
        session_tx,
    );
    tokio::spawn(handle_session_events(session_rx));
    session.connect();

    // Account snapshot poller, when credentials are available.
    let (trigger_tx, trigger_rx) = mpsc::channel::<()>(8);
    match resolve_credentials(&settings) {
        Some(credentials) => {
            let client = BinanceRestClient::new(settings.rest_url.clone(), credentials)?;
            let poller = Arc::new(SnapshotPoller::new(
                client,
                settings.allowed_assets.clone(),
            ));
            tokio::spawn(poller.run(
                settings.poll_interval,
                trigger_rx,
                shutdown_token.clone(),
            ));
        }
        None => {
            tracing::warn!("no credentials found, account polling disabled");
            drop(trigger_rx);
        }
    }
    let _trigger_tx = trigger_tx;

    tracing::info!("Dashboard core ready");

    await_shutdown(&shutdown_token).await;
    session.disconnect();

    tracing::info!("Dashboard core stopped");
    Ok(())
}

/// Log session lifecycle events.
async fn handle_session_events(mut rx: mpsc::Receiver<SessionEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Open => tracing::info!("market session open"),
            SessionEvent::SubscribeAcked { id } => {
                tracing::info!(id, "subscription acknowledged");
            }
            SessionEvent::Closed { reason } => {
                tracing::warn!(reason, "market session closed");
            }
        }
    }
}

/// Credentials from the environment, falling back to the credential store.
fn resolve_credentials(settings: &Settings) -> Option<Credentials> {
    if let Ok(credentials) = Settings::credentials_from_env() {
        return Some(credentials);
    }

    let store = CredentialStore::new(&settings.store_dir);
    match store.load() {
        Ok(Some((api_key, api_secret))) => Credentials::new(api_key, api_secret).ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "credential store unreadable");
            None
        }
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: &CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
