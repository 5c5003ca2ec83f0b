//! Market Data Types and Buffers
//!
//! Domain types for the three public streams (trade, kline, book ticker) and
//! the per-symbol bounded buffers they land in.
//!
//! # Design
//!
//! Trades and klines are append-only history: each symbol keeps the last N
//! events in a FIFO buffer (N = 20 for trades, 50 for klines), evicting from
//! the front once full. The book ticker is a latest-value slot: each update
//! replaces the previous snapshot in place, no history retained.
//!
//! The store has a single writer (the stream router callback); concurrent
//! readers always receive cloned snapshots, never a partially-updated buffer.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// =============================================================================
// Symbol
// =============================================================================

/// Trading pair identifier. Closed set: the dashboard tracks exactly three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    /// ETH/USDT pair.
    Ethusdt,
    /// BTC/USDT pair.
    Btcusdt,
    /// SOL/USDT pair.
    Solusdt,
}

impl Symbol {
    /// All tracked symbols, in subscription order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Ethusdt, Self::Btcusdt, Self::Solusdt]
    }

    /// Upper-case pair name as used by the REST API and persistence keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ethusdt => "ETHUSDT",
            Self::Btcusdt => "BTCUSDT",
            Self::Solusdt => "SOLUSDT",
        }
    }

    /// Lower-case pair name as used in stream names.
    #[must_use]
    pub const fn stream_name(&self) -> &'static str {
        match self {
            Self::Ethusdt => "ethusdt",
            Self::Btcusdt => "btcusdt",
            Self::Solusdt => "solusdt",
        }
    }

    /// Base asset of the pair (the coin being traded).
    #[must_use]
    pub const fn base_asset(&self) -> &'static str {
        match self {
            Self::Ethusdt => "ETH",
            Self::Btcusdt => "BTC",
            Self::Solusdt => "SOL",
        }
    }

    /// Quote asset of the pair.
    #[must_use]
    pub const fn quote_asset(&self) -> &'static str {
        "USDT"
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a symbol string is not one of the tracked pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown symbol: {0}")]
pub struct UnknownSymbol(pub String);

impl FromStr for Symbol {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ETHUSDT" => Ok(Self::Ethusdt),
            "BTCUSDT" => Ok(Self::Btcusdt),
            "SOLUSDT" => Ok(Self::Solusdt),
            _ => Err(UnknownSymbol(s.to_string())),
        }
    }
}

// =============================================================================
// Stream Events
// =============================================================================

/// A single executed trade from the `<symbol>@trade` stream.
///
/// Immutable once created; appended to the per-symbol trade buffer.
/// Prices and quantities stay as decimal strings, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Trading pair.
    pub symbol: Symbol,
    /// Exchange-assigned trade ID.
    pub trade_id: u64,
    /// Execution price (decimal string).
    pub price: String,
    /// Executed quantity (decimal string).
    pub quantity: String,
    /// Trade time, epoch milliseconds.
    pub trade_time_ms: i64,
    /// Whether the buyer was the maker.
    pub is_buyer_maker: bool,
}

/// One candle update from the `<symbol>@kline_1s` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineEvent {
    /// Trading pair.
    pub symbol: Symbol,
    /// Candle interval (e.g. "1s").
    pub interval: String,
    /// Candle open time, epoch milliseconds.
    pub open_time_ms: i64,
    /// Candle close time, epoch milliseconds.
    pub close_time_ms: i64,
    /// Open price (decimal string).
    pub open: String,
    /// High price (decimal string).
    pub high: String,
    /// Low price (decimal string).
    pub low: String,
    /// Close price (decimal string).
    pub close: String,
    /// Base-asset volume (decimal string).
    pub volume: String,
    /// Whether this candle is closed.
    pub is_final: bool,
}

/// Best bid/ask snapshot from the `<symbol>@bookTicker` stream.
///
/// Latest-value entity: each update replaces the prior snapshot for its
/// symbol. `None` until the first message arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTickerSnapshot {
    /// Trading pair.
    pub symbol: Symbol,
    /// Order book update ID.
    pub update_id: u64,
    /// Best bid price (decimal string).
    pub best_bid: String,
    /// Best bid quantity (decimal string).
    pub best_bid_qty: String,
    /// Best ask price (decimal string).
    pub best_ask: String,
    /// Best ask quantity (decimal string).
    pub best_ask_qty: String,
}

// =============================================================================
// Bounded Buffer
// =============================================================================

/// Trade buffer capacity per symbol.
pub const TRADE_BUFFER_CAPACITY: usize = 20;

/// Kline buffer capacity per symbol.
pub const KLINE_BUFFER_CAPACITY: usize = 50;

/// Fixed-capacity FIFO buffer.
///
/// Appending beyond capacity drops the oldest entries, so the buffer always
/// holds the most recent `capacity` items in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer with the given capacity.
    ///
    /// A zero capacity is treated as 1 so an append is never a no-op.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest if the buffer is full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest-to-newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Most recent item, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// Snapshot of the contents, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Rebuild a buffer from a snapshot, keeping only the last `capacity`
    /// items when the snapshot is longer.
    #[must_use]
    pub fn from_vec(items: Vec<T>, capacity: usize) -> Self {
        let mut buffer = Self::new(capacity);
        for item in items {
            buffer.push(item);
        }
        buffer
    }
}

// =============================================================================
// Per-symbol State
// =============================================================================

/// Buffered stream state for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolState {
    /// Recent trades, oldest first.
    pub trades: BoundedBuffer<TradeEvent>,
    /// Recent kline updates, oldest first.
    pub klines: BoundedBuffer<KlineEvent>,
    /// Latest book ticker, if any has arrived.
    pub book_ticker: Option<BookTickerSnapshot>,
}

impl Default for SymbolState {
    fn default() -> Self {
        Self {
            trades: BoundedBuffer::new(TRADE_BUFFER_CAPACITY),
            klines: BoundedBuffer::new(KLINE_BUFFER_CAPACITY),
            book_ticker: None,
        }
    }
}

/// Full per-symbol trade history, as mirrored to durable storage.
pub type TradeHistory = std::collections::HashMap<Symbol, Vec<TradeEvent>>;

// =============================================================================
// Market Store
// =============================================================================

/// Shared store of per-symbol stream state.
///
/// Written only by the session's router callback; read concurrently by the
/// UI. Readers get cloned snapshots.
#[derive(Debug, Default)]
pub struct MarketStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    eth: SymbolState,
    btc: SymbolState,
    sol: SymbolState,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            eth: SymbolState::default(),
            btc: SymbolState::default(),
            sol: SymbolState::default(),
        }
    }
}

impl StoreInner {
    const fn state_mut(&mut self, symbol: Symbol) -> &mut SymbolState {
        match symbol {
            Symbol::Ethusdt => &mut self.eth,
            Symbol::Btcusdt => &mut self.btc,
            Symbol::Solusdt => &mut self.sol,
        }
    }

    const fn state(&self, symbol: Symbol) -> &SymbolState {
        match symbol {
            Symbol::Ethusdt => &self.eth,
            Symbol::Btcusdt => &self.btc,
            Symbol::Solusdt => &self.sol,
        }
    }
}

impl MarketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trade to its symbol's buffer.
    pub fn append_trade(&self, event: TradeEvent) {
        self.inner.write().state_mut(event.symbol).trades.push(event);
    }

    /// Append a kline update to its symbol's buffer.
    pub fn append_kline(&self, event: KlineEvent) {
        self.inner.write().state_mut(event.symbol).klines.push(event);
    }

    /// Replace the latest book ticker for its symbol.
    pub fn set_book_ticker(&self, snapshot: BookTickerSnapshot) {
        let symbol = snapshot.symbol;
        self.inner.write().state_mut(symbol).book_ticker = Some(snapshot);
    }

    /// Snapshot of one symbol's state.
    #[must_use]
    pub fn symbol_state(&self, symbol: Symbol) -> SymbolState {
        self.inner.read().state(symbol).clone()
    }

    /// Latest book ticker for a symbol, if any.
    #[must_use]
    pub fn book_ticker(&self, symbol: Symbol) -> Option<BookTickerSnapshot> {
        self.inner.read().state(symbol).book_ticker.clone()
    }

    /// Full trade history for all symbols (for the persistence mirror).
    #[must_use]
    pub fn trade_history(&self) -> TradeHistory {
        let inner = self.inner.read();
        Symbol::all()
            .into_iter()
            .map(|symbol| (symbol, inner.state(symbol).trades.to_vec()))
            .collect()
    }

    /// Rehydrate trade buffers from persisted history.
    ///
    /// Histories longer than the buffer capacity keep only the most recent
    /// entries.
    pub fn load_trade_history(&self, history: TradeHistory) {
        let mut inner = self.inner.write();
        for (symbol, trades) in history {
            inner.state_mut(symbol).trades =
                BoundedBuffer::from_vec(trades, TRADE_BUFFER_CAPACITY);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn trade(symbol: Symbol, trade_id: u64) -> TradeEvent {
        TradeEvent {
            symbol,
            trade_id,
            price: "100.5".to_string(),
            quantity: "0.25".to_string(),
            trade_time_ms: 1_700_000_000_000 + trade_id as i64,
            is_buyer_maker: trade_id % 2 == 0,
        }
    }

    fn ticker(symbol: Symbol, update_id: u64) -> BookTickerSnapshot {
        BookTickerSnapshot {
            symbol,
            update_id,
            best_bid: "99.9".to_string(),
            best_bid_qty: "1".to_string(),
            best_ask: "100.1".to_string(),
            best_ask_qty: "2".to_string(),
        }
    }

    #[test]
    fn symbol_parses_either_case() {
        assert_eq!("ethusdt".parse::<Symbol>().unwrap(), Symbol::Ethusdt);
        assert_eq!("BTCUSDT".parse::<Symbol>().unwrap(), Symbol::Btcusdt);
        assert!("DOGEUSDT".parse::<Symbol>().is_err());
    }

    #[test]
    fn symbol_assets() {
        assert_eq!(Symbol::Solusdt.base_asset(), "SOL");
        assert_eq!(Symbol::Solusdt.quote_asset(), "USDT");
        assert_eq!(Symbol::Solusdt.stream_name(), "solusdt");
    }

    #[test]
    fn bounded_buffer_evicts_oldest() {
        let mut buffer = BoundedBuffer::new(3);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.to_vec(), vec![2, 3, 4]);
        assert_eq!(buffer.latest(), Some(&4));
    }

    #[test]
    fn bounded_buffer_zero_capacity_clamped() {
        let mut buffer = BoundedBuffer::new(0);
        buffer.push(7);
        assert_eq!(buffer.to_vec(), vec![7]);
    }

    #[test]
    fn bounded_buffer_from_vec_truncates_front() {
        let buffer = BoundedBuffer::from_vec((0..10).collect(), 4);
        assert_eq!(buffer.to_vec(), vec![6, 7, 8, 9]);
    }

    proptest! {
        #[test]
        fn buffer_keeps_last_capacity_items_in_order(
            capacity in 1usize..64,
            count in 0usize..256,
        ) {
            let mut buffer = BoundedBuffer::new(capacity);
            for i in 0..count {
                buffer.push(i);
            }
            let expected: Vec<usize> =
                (count.saturating_sub(capacity)..count).collect();
            prop_assert_eq!(buffer.len(), count.min(capacity));
            prop_assert_eq!(buffer.to_vec(), expected);
        }
    }

    #[test]
    fn store_trade_append_is_per_symbol() {
        let store = MarketStore::new();
        store.append_trade(trade(Symbol::Ethusdt, 1));
        store.append_trade(trade(Symbol::Btcusdt, 2));

        assert_eq!(store.symbol_state(Symbol::Ethusdt).trades.len(), 1);
        assert_eq!(store.symbol_state(Symbol::Btcusdt).trades.len(), 1);
        assert!(store.symbol_state(Symbol::Solusdt).trades.is_empty());
    }

    #[test]
    fn store_trade_buffer_caps_at_twenty() {
        let store = MarketStore::new();
        for i in 0..40 {
            store.append_trade(trade(Symbol::Ethusdt, i));
        }
        let state = store.symbol_state(Symbol::Ethusdt);
        assert_eq!(state.trades.len(), TRADE_BUFFER_CAPACITY);
        assert_eq!(
            state.trades.iter().next().map(|t| t.trade_id),
            Some(20)
        );
    }

    #[test]
    fn book_ticker_is_replace_not_accumulate() {
        let store = MarketStore::new();
        store.set_book_ticker(ticker(Symbol::Solusdt, 1));
        store.set_book_ticker(ticker(Symbol::Solusdt, 2));

        let latest = store.book_ticker(Symbol::Solusdt).unwrap();
        assert_eq!(latest.update_id, 2);
        assert!(store.book_ticker(Symbol::Ethusdt).is_none());
    }

    #[test]
    fn trade_history_round_trips_through_store() {
        let store = MarketStore::new();
        store.append_trade(trade(Symbol::Ethusdt, 1));
        store.append_trade(trade(Symbol::Ethusdt, 2));

        let history = store.trade_history();
        assert_eq!(history[&Symbol::Ethusdt].len(), 2);
        assert!(history[&Symbol::Btcusdt].is_empty());

        let restored = MarketStore::new();
        restored.load_trade_history(history.clone());
        assert_eq!(restored.trade_history(), history);
    }
}
