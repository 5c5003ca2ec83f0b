//! Stream Router
//!
//! Classifies each inbound text frame from the multiplexed socket and
//! dispatches it to exactly one sink: trade, kline, book ticker, subscribe
//! acknowledgment, or the diagnostic sink for anything unrecognized.
//!
//! # Design
//!
//! The router is a pure function invoked once per frame; it holds no state.
//! Dispatch is by explicit discriminator: frames with `e == "trade"` or
//! `e == "kline"` go to their sinks, frames carrying the book-ticker field
//! set (which has no `e` field on the wire) go to the ticker sink, and
//! `{"result":null,"id":...}` frames are subscribe acks. A frame matching
//! none of these is routed to [`RoutedEvent::Unknown`] rather than being
//! misfiled as a price snapshot.
//!
//! Malformed frames and unknown symbols never propagate as fatal errors: the
//! caller logs and drops them.

use serde_json::Value;

use super::messages::{BookTickerMessage, KlineMessage, SubscribeAck, TradeMessage};
use crate::domain::market::{BookTickerSnapshot, KlineEvent, Symbol, TradeEvent};

// =============================================================================
// Error Type
// =============================================================================

/// Reasons a frame was dropped instead of routed.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Frame was not valid JSON or did not match its declared shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame referenced a symbol outside the tracked set.
    #[error("unknown symbol in frame: {0}")]
    UnknownSymbol(String),
}

// =============================================================================
// Routed Events
// =============================================================================

/// Result of classifying one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedEvent {
    /// A trade for the trade buffer.
    Trade(TradeEvent),
    /// A kline update for the kline buffer.
    Kline(KlineEvent),
    /// A book ticker update for the latest-value slot.
    BookTicker(BookTickerSnapshot),
    /// Confirmation of the subscribe directive.
    SubscribeAck(SubscribeAck),
    /// Frame parsed as JSON but matched no known shape. Diagnostic only.
    Unknown {
        /// The `e` discriminator if one was present.
        event_type: Option<String>,
    },
}

// =============================================================================
// Dispatch
// =============================================================================

/// Classify one inbound text frame.
///
/// # Errors
///
/// Returns [`RouteError::Malformed`] when the frame is not JSON or does not
/// deserialize as its declared type, and [`RouteError::UnknownSymbol`] when
/// the symbol is outside the tracked set. Both are drop-and-log conditions
/// for the caller, never fatal.
pub fn route(frame: &str) -> Result<RoutedEvent, RouteError> {
    let value: Value = serde_json::from_str(frame)?;

    if let Some(event_type) = value.get("e").and_then(Value::as_str) {
        return match event_type {
            "trade" => route_trade(value),
            "kline" => route_kline(value),
            other => Ok(RoutedEvent::Unknown {
                event_type: Some(other.to_string()),
            }),
        };
    }

    // Subscribe acks carry {result, id} and nothing else of interest.
    if value.get("id").is_some() && value.get("result").is_some() {
        let ack: SubscribeAck = serde_json::from_value(value)?;
        return Ok(RoutedEvent::SubscribeAck(ack));
    }

    // Book ticker frames have no event-type field; require their exact
    // field set instead of defaulting everything else into this sink.
    if has_book_ticker_shape(&value) {
        return route_book_ticker(value);
    }

    Ok(RoutedEvent::Unknown { event_type: None })
}

fn has_book_ticker_shape(value: &Value) -> bool {
    ["u", "s", "b", "B", "a", "A"]
        .iter()
        .all(|field| value.get(field).is_some())
}

fn parse_symbol(raw: &str) -> Result<Symbol, RouteError> {
    raw.parse()
        .map_err(|_| RouteError::UnknownSymbol(raw.to_string()))
}

fn route_trade(value: Value) -> Result<RoutedEvent, RouteError> {
    let msg: TradeMessage = serde_json::from_value(value)?;
    let symbol = parse_symbol(&msg.symbol)?;
    Ok(RoutedEvent::Trade(TradeEvent {
        symbol,
        trade_id: msg.trade_id,
        price: msg.price,
        quantity: msg.quantity,
        trade_time_ms: msg.trade_time,
        is_buyer_maker: msg.is_buyer_maker,
    }))
}

fn route_kline(value: Value) -> Result<RoutedEvent, RouteError> {
    let msg: KlineMessage = serde_json::from_value(value)?;
    let symbol = parse_symbol(&msg.symbol)?;
    Ok(RoutedEvent::Kline(KlineEvent {
        symbol,
        interval: msg.kline.interval,
        open_time_ms: msg.kline.open_time,
        close_time_ms: msg.kline.close_time,
        open: msg.kline.open,
        high: msg.kline.high,
        low: msg.kline.low,
        close: msg.kline.close,
        volume: msg.kline.volume,
        is_final: msg.kline.is_final,
    }))
}

fn route_book_ticker(value: Value) -> Result<RoutedEvent, RouteError> {
    let msg: BookTickerMessage = serde_json::from_value(value)?;
    let symbol = parse_symbol(&msg.symbol)?;
    Ok(RoutedEvent::BookTicker(BookTickerSnapshot {
        symbol,
        update_id: msg.update_id,
        best_bid: msg.best_bid,
        best_bid_qty: msg.best_bid_qty,
        best_ask: msg.best_ask,
        best_ask_qty: msg.best_ask_qty,
    }))
}

// =============================================================================
// Tests
// =============================================================================
