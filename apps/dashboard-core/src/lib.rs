#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access
    )
)]

//! Dashboard Core - Mini Exchange Dashboard Backend
//!
//! Headless core for a Binance-testnet dashboard. Maintains one multiplexed
//! WebSocket subscription over nine public market-data streams, demultiplexes
//! frames into per-symbol bounded buffers, polls the signed account/order
//! REST API, and validates order submissions client-side before they reach
//! the exchange.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Market data and account types with no I/O
//!   - `market`: Symbols, stream events, bounded buffers, the shared store
//!   - `account`: Balances, order enums, order records
//!
//! - **Application**: Use cases over the domain
//!   - `snapshot`: Account snapshot polling and filtering
//!   - `orders`: Client-side order validation and submission
//!   - `calculators` / `worker`: Pure calculators behind message passing
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `binance`: WebSocket session, frame router, signed REST client
//!   - `persistence`: Trade mirror and credential store files
//!   - `config`: Environment-driven settings
//!   - `telemetry`: Tracing subscriber setup
//!
//! # Data Flow
//!
//! ```text
//! Binance WS ──► MarketSession ──► route() ──► MarketStore ──► readers
//!                                     │
//!                                     └──► TradeStore (durable mirror)
//!
//! Binance REST ◄── SnapshotPoller / OrderGateway (signed requests)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Market data and account types with no I/O.
pub mod domain;

/// Application layer - Use cases over the domain.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::account::{AccountBalance, NewOrder, OrderRecord, OrderSide, OrderType, TimeInForce};
pub use domain::market::{
    BookTickerSnapshot, BoundedBuffer, KlineEvent, MarketStore, Symbol, SymbolState, TradeEvent,
    TradeHistory,
};

// Application services
pub use application::{
    AccountSnapshot, CalcRequest, CalcResponse, CalculatorHandle, OrderError, OrderGateway,
    OrderRequest, SnapshotPoller, ValidationError,
};

// Infrastructure adapters
pub use infrastructure::binance::{
    BinanceRestClient, ConnectionState, MarketSession, OrderHistoryQuery, RestError, RoutedEvent,
    SessionEvent, route,
};
pub use infrastructure::config::{ConfigError, Credentials, Settings};
pub use infrastructure::persistence::{CredentialStore, PersistError, TradeStore};
