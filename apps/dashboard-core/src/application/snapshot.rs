//! Account Snapshot Poller
//!
//! Keeps a read-only mirror of the account's balances and open orders,
//! refreshed on a fixed interval and on explicit triggers (login, order
//! submission). Every fetch independently overwrites the shared snapshot;
//! overlapping fetches resolve last-write-wins, which is acceptable for a
//! dashboard view.
//!
//! Balances are restricted to the configured asset allow-list and to entries
//! with a nonzero free-or-locked amount before being surfaced.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::account::{AccountBalance, OrderRecord};
use crate::infrastructure::binance::{BinanceRestClient, RestError};

/// One refresh of account state, replaced wholesale on each fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Allow-listed, nonzero balances.
    pub balances: Vec<AccountBalance>,
    /// Currently open orders across all symbols.
    pub open_orders: Vec<OrderRecord>,
    /// Local fetch completion time, epoch milliseconds.
    pub fetched_at_ms: i64,
}

/// Periodic account snapshot fetcher.
pub struct SnapshotPoller {
    client: BinanceRestClient,
    allowed_assets: Vec<String>,
    snapshot: Arc<RwLock<Option<AccountSnapshot>>>,
}

impl SnapshotPoller {
    /// Create a poller bound to one REST client and asset allow-list.
    #[must_use]
    pub fn new(client: BinanceRestClient, allowed_assets: Vec<String>) -> Self {
        Self {
            client,
            allowed_assets,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Latest snapshot, if at least one fetch has succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<AccountSnapshot> {
        self.snapshot.read().clone()
    }

    /// Fetch balances and open orders once, replacing the shared snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] when either REST call fails; the previous
    /// snapshot is left untouched.
    pub async fn fetch_once(&self) -> Result<(), RestError> {
        let account = self.client.account().await?;
        let open_orders = self.client.open_orders(None).await?;

        let balances = filter_balances(account.balances, &self.allowed_assets);
        let snapshot = AccountSnapshot {
            balances,
            open_orders,
            fetched_at_ms: Utc::now().timestamp_millis(),
        };

        tracing::debug!(
            balances = snapshot.balances.len(),
            open_orders = snapshot.open_orders.len(),
            "account snapshot refreshed"
        );
        *self.snapshot.write() = Some(snapshot);
        Ok(())
    }

    /// Poll until cancelled: once immediately, then on every interval tick
    /// and every trigger message.
    ///
    /// Fetch failures are logged and the loop continues; the snapshot only
    /// changes on success.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        mut trigger_rx: mpsc::Receiver<()>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("snapshot poller stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.fetch_once().await {
                        tracing::warn!(error = %e, "scheduled snapshot fetch failed");
                    }
                }
                trigger = trigger_rx.recv() => {
                    match trigger {
                        Some(()) => {
                            if let Err(e) = self.fetch_once().await {
                                tracing::warn!(error = %e, "triggered snapshot fetch failed");
                            }
                        }
                        None => {
                            tracing::debug!("snapshot trigger channel closed");
                            cancel.cancelled().await;
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Keep allow-listed assets with a nonzero free-or-locked amount.
fn filter_balances(balances: Vec<AccountBalance>, allowed: &[String]) -> Vec<AccountBalance> {
    balances
        .into_iter()
        .filter(|balance| allowed.iter().any(|asset| asset == &balance.asset))
        .filter(AccountBalance::is_nonzero)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
