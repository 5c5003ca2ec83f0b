//! Market Data Session
//!
//! Owns the single multiplexed WebSocket connection over all nine public
//! streams. Connecting sends one subscribe directive immediately on open,
//! then demultiplexes inbound frames into the shared [`MarketStore`].
//!
//! # Lifecycle
//!
//! `connect` tears down any previous connection task before starting a new
//! one, so at most one socket is live per session. Each connection carries a
//! generation number; a superseded task may still be winding down while its
//! replacement runs, and its state writes and lifecycle events are discarded
//! so they cannot clobber the live connection. There is no automatic
//! reconnect: when the socket drops, the session goes `Disconnected`, emits
//! a [`SessionEvent::Closed`], and waits for the next explicit `connect`.
//!
//! Malformed frames and unknown symbols are logged and dropped; they never
//! tear the connection down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::messages::SubscribeRequest;
use super::router::{RoutedEvent, route};
use crate::domain::market::{MarketStore, Symbol};
use crate::infrastructure::persistence::TradeStore;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can end a connection attempt.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Initial WebSocket handshake failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket protocol error after the handshake.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Session State and Events
// =============================================================================

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live socket.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Socket open and subscribed.
    Open,
}

/// Lifecycle notifications emitted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Socket opened and the subscribe directive was sent.
    Open,
    /// Server acknowledged the subscribe directive.
    SubscribeAcked {
        /// Echoed request ID.
        id: u64,
    },
    /// Connection ended; an explicit `connect` is needed to resume.
    Closed {
        /// Human-readable close reason.
        reason: String,
    },
}

// =============================================================================
// Market Session
// =============================================================================

/// Shared state one connection task writes through, tagged with the
/// generation that task was spawned under.
struct StateHandle {
    state: Arc<RwLock<ConnectionState>>,
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl StateHandle {
    /// Apply a state transition, unless a newer `connect` superseded this
    /// task. Returns whether the transition was applied.
    ///
    /// The generation check happens under the state write lock: once a
    /// replacement bumps the generation and takes the lock, a stale task can
    /// no longer slip a write in behind it.
    fn transition(&self, next: ConnectionState) -> bool {
        let mut guard = self.state.write();
        if self.latest.load(Ordering::SeqCst) == self.generation {
            *guard = next;
            true
        } else {
            false
        }
    }
}

/// The one market data session of the dashboard.
pub struct MarketSession {
    url: String,
    store: Arc<MarketStore>,
    mirror: Option<TradeStore>,
    event_tx: mpsc::Sender<SessionEvent>,
    state: Arc<RwLock<ConnectionState>>,
    current: Mutex<Option<CancellationToken>>,
    latest_generation: Arc<AtomicU64>,
}

impl MarketSession {
    /// Create a session bound to one stream URL and shared store.
    ///
    /// When a `mirror` is given, every appended trade also refreshes the
    /// durable trade history.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        store: Arc<MarketStore>,
        mirror: Option<TradeStore>,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            store,
            mirror,
            event_tx,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            current: Mutex::new(None),
            latest_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Open a new connection, replacing any existing one.
    ///
    /// The previous connection task, if any, is cancelled before the new
    /// handshake starts.
    pub fn connect(&self) {
        let generation = self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }

        *self.state.write() = ConnectionState::Connecting;

        let url = self.url.clone();
        let store = Arc::clone(&self.store);
        let mirror = self.mirror.clone();
        let event_tx = self.event_tx.clone();
        let handle = StateHandle {
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.latest_generation),
            generation,
        };

        tokio::spawn(async move {
            let result = run_connection(&url, &store, mirror.as_ref(), &event_tx, &token, &handle)
                .await;

            if !handle.transition(ConnectionState::Disconnected) {
                tracing::debug!(generation, "superseded connection task finished");
                return;
            }
            let reason = match result {
                Ok(()) => "cancelled".to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "market session ended");
                    e.to_string()
                }
            };
            let _ = event_tx.send(SessionEvent::Closed { reason }).await;
        });
    }

    /// Tear down the current connection, if any.
    pub fn disconnect(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
        *self.state.write() = ConnectionState::Disconnected;
    }
}

/// Connect, subscribe, and pump frames until cancelled or the socket drops.
async fn run_connection(
    url: &str,
    store: &MarketStore,
    mirror: Option<&TradeStore>,
    event_tx: &mpsc::Sender<SessionEvent>,
    cancel: &CancellationToken,
    handle: &StateHandle,
) -> Result<(), SessionError> {
    tracing::info!(url, "connecting market data session");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| SessionError::ConnectionFailed(e.to_string()))?;
    let (mut write, mut read) = ws_stream.split();

    // One subscribe directive per connection, sent immediately on open.
    let request = SubscribeRequest::for_symbols(&Symbol::all());
    let json = serde_json::to_string(&request)
        .map_err(|e| SessionError::ConnectionFailed(format!("subscribe serialize: {e}")))?;
    write.send(Message::Text(json.into())).await?;

    if !handle.transition(ConnectionState::Open) {
        // Replaced while the handshake was in flight; the new task owns the
        // state machine now.
        return Ok(());
    }
    let _ = event_tx.send(SessionEvent::Open).await;
    tracing::info!(streams = request.params.len(), "market streams subscribed");

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("market session cancelled");
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&text, store, mirror, event_tx).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "server sent close frame");
                        return Err(SessionError::ConnectionClosed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(SessionError::ConnectionClosed),
                }
            }
        }
    }
}

/// Route one text frame into the store and lifecycle channel.
async fn handle_frame(
    frame: &str,
    store: &MarketStore,
    mirror: Option<&TradeStore>,
    event_tx: &mpsc::Sender<SessionEvent>,
) {
    match route(frame) {
        Ok(RoutedEvent::Trade(trade)) => {
            store.append_trade(trade);
            if let Some(mirror) = mirror {
                if let Err(e) = mirror.save(&store.trade_history()) {
                    tracing::warn!(error = %e, "trade mirror write failed");
                }
            }
        }
        Ok(RoutedEvent::Kline(kline)) => store.append_kline(kline),
        Ok(RoutedEvent::BookTicker(ticker)) => store.set_book_ticker(ticker),
        Ok(RoutedEvent::SubscribeAck(ack)) => {
            let _ = event_tx.send(SessionEvent::SubscribeAcked { id: ack.id }).await;
        }
        Ok(RoutedEvent::Unknown { event_type }) => {
            tracing::debug!(?event_type, "dropping unrecognized frame");
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping unroutable frame");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
