//! Account Mirror Types
//!
//! Read-only mirrors of exchange account state sourced from the signed REST
//! API. Balances are replaced wholesale on each poll; order records are never
//! mutated locally except by re-fetch.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Balances
// =============================================================================

/// One asset's balance from the account endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Asset code (e.g. "BTC").
    pub asset: String,
    /// Freely available amount (decimal string).
    pub free: String,
    /// Amount locked in open orders (decimal string).
    pub locked: String,
}

impl AccountBalance {
    /// Available amount as a decimal; zero when the string is malformed.
    #[must_use]
    pub fn free_amount(&self) -> Decimal {
        Decimal::from_str(&self.free).unwrap_or_default()
    }

    /// Locked amount as a decimal; zero when the string is malformed.
    #[must_use]
    pub fn locked_amount(&self) -> Decimal {
        Decimal::from_str(&self.locked).unwrap_or_default()
    }

    /// Total of free + locked.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.free_amount() + self.locked_amount()
    }

    /// Whether any of free or locked is nonzero.
    #[must_use]
    pub fn is_nonzero(&self) -> bool {
        !self.total().is_zero()
    }
}

// =============================================================================
// Order Enums
// =============================================================================

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Buy the base asset.
    Buy,
    /// Sell the base asset.
    Sell,
}

impl OrderSide {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type. The dashboard places only market and limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute immediately at the best available price.
    Market,
    /// Rest on the book at a specified price.
    Limit,
}

impl OrderType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order time-in-force. Limit orders are always submitted GTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
}

impl TimeInForce {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gtc => "GTC",
            Self::Ioc => "IOC",
            Self::Fok => "FOK",
        }
    }
}

// =============================================================================
// New Order
// =============================================================================

/// A validated order ready for submission.
///
/// Construction goes through the order gateway, which enforces the
/// client-side preconditions (affordability, required price for limit
/// orders) before anything touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Trading pair.
    pub symbol: crate::domain::market::Symbol,
    /// Order direction.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Base-asset quantity.
    pub quantity: Decimal,
    /// Limit price; required iff the order is a limit order.
    pub price: Option<Decimal>,
    /// Time in force; forced to GTC for limit orders.
    pub time_in_force: Option<TimeInForce>,
    /// Optional client-assigned order ID.
    pub new_client_order_id: Option<String>,
}

// =============================================================================
// Order Record
// =============================================================================

/// Exchange-side order state, returned verbatim from the REST API.
///
/// Fields the dashboard does not consume are kept as plain strings so records
/// survive unknown statuses without a schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Trading pair.
    pub symbol: String,
    /// Exchange-assigned order ID.
    pub order_id: u64,
    /// Client-assigned order ID.
    #[serde(default)]
    pub client_order_id: String,
    /// Limit price ("0.00000000" for market orders).
    #[serde(default)]
    pub price: String,
    /// Original order quantity.
    #[serde(default)]
    pub orig_qty: String,
    /// Quantity executed so far.
    #[serde(default)]
    pub executed_qty: String,
    /// Cumulative quote-asset amount filled.
    #[serde(default)]
    pub cummulative_quote_qty: String,
    /// Order status (NEW, FILLED, CANCELED, ...).
    #[serde(default)]
    pub status: String,
    /// Time in force.
    #[serde(default)]
    pub time_in_force: String,
    /// Order type.
    #[serde(rename = "type", default)]
    pub order_type: String,
    /// Order side.
    #[serde(default)]
    pub side: String,
    /// Order creation time, epoch milliseconds.
    #[serde(default, alias = "transactTime")]
    pub time: i64,
    /// Last update time, epoch milliseconds.
    #[serde(default)]
    pub update_time: i64,
}
