//! Binance WebSocket Message Types
//!
//! Wire format types for the multiplexed public stream connection. These map
//! directly to Binance's JSON schemas with their single-letter field names.
//!
//! # Message Types
//!
//! - `TradeMessage`: one executed trade, from `<symbol>@trade`
//! - `KlineMessage`: candle update (nested `k` payload), from `<symbol>@kline_1s`
//! - `BookTickerMessage`: best bid/ask, from `<symbol>@bookTicker`; carries
//!   **no** `e` discriminator, only its characteristic field set
//! - `SubscribeAck`: `{"result": null, "id": 1}` confirmation frame
//!
//! # Wire Format Examples
//!
//! ```json
//! {"e":"trade","E":1700000000100,"s":"ETHUSDT","t":991,"p":"2000.01","q":"0.5","T":1700000000099,"m":true,"M":true}
//! {"u":400900217,"s":"BTCUSDT","b":"25.35","B":"31.21","a":"25.36","A":"40.66"}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::market::Symbol;

/// Stream name suffix for trades.
pub const TRADE_STREAM: &str = "trade";

/// Stream name suffix for one-second klines.
pub const KLINE_STREAM: &str = "kline_1s";

/// Stream name suffix for book tickers.
pub const BOOK_TICKER_STREAM: &str = "bookTicker";

// =============================================================================
// Subscribe Directive
// =============================================================================

/// Subscription directive sent once per connection, immediately on open.
///
/// # Wire Format
/// ```json
/// {"method":"SUBSCRIBE","params":["ethusdt@trade", ...],"id":1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Always "SUBSCRIBE".
    pub method: String,
    /// Stream names, lower-case symbol prefixed.
    pub params: Vec<String>,
    /// Request ID echoed in the acknowledgment.
    pub id: u64,
}

impl SubscribeRequest {
    /// Build the directive covering all nine streams for the given symbols.
    #[must_use]
    pub fn for_symbols(symbols: &[Symbol]) -> Self {
        let mut params = Vec::with_capacity(symbols.len() * 3);
        for kind in [TRADE_STREAM, KLINE_STREAM, BOOK_TICKER_STREAM] {
            for symbol in symbols {
                params.push(format!("{}@{kind}", symbol.stream_name()));
            }
        }
        Self {
            method: "SUBSCRIBE".to_string(),
            params,
            id: 1,
        }
    }
}

/// Acknowledgment frame for a subscribe directive.
///
/// # Wire Format
/// ```json
/// {"result": null, "id": 1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeAck {
    /// `None` on success; error payloads carry a value.
    pub result: Option<serde_json::Value>,
    /// Echoed request ID.
    pub id: u64,
}

// =============================================================================
// Trade Stream
// =============================================================================

/// One executed trade from the `@trade` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMessage {
    /// Event type (always "trade").
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time, epoch milliseconds.
    #[serde(rename = "E")]
    pub event_time: i64,

    /// Trading pair (upper-case).
    #[serde(rename = "s")]
    pub symbol: String,

    /// Trade ID.
    #[serde(rename = "t")]
    pub trade_id: u64,

    /// Price (decimal string).
    #[serde(rename = "p")]
    pub price: String,

    /// Quantity (decimal string).
    #[serde(rename = "q")]
    pub quantity: String,

    /// Trade time, epoch milliseconds.
    #[serde(rename = "T")]
    pub trade_time: i64,

    /// Whether the buyer is the market maker.
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

// =============================================================================
// Kline Stream
// =============================================================================

/// Candle update from the `@kline_1s` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineMessage {
    /// Event type (always "kline").
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time, epoch milliseconds.
    #[serde(rename = "E")]
    pub event_time: i64,

    /// Trading pair (upper-case).
    #[serde(rename = "s")]
    pub symbol: String,

    /// Candle payload.
    #[serde(rename = "k")]
    pub kline: KlinePayload,
}

/// Nested candle payload of a kline message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlinePayload {
    /// Candle open time, epoch milliseconds.
    #[serde(rename = "t")]
    pub open_time: i64,

    /// Candle close time, epoch milliseconds.
    #[serde(rename = "T")]
    pub close_time: i64,

    /// Interval (e.g. "1s").
    #[serde(rename = "i")]
    pub interval: String,

    /// Open price (decimal string).
    #[serde(rename = "o")]
    pub open: String,

    /// Close price (decimal string).
    #[serde(rename = "c")]
    pub close: String,

    /// High price (decimal string).
    #[serde(rename = "h")]
    pub high: String,

    /// Low price (decimal string).
    #[serde(rename = "l")]
    pub low: String,

    /// Base-asset volume (decimal string).
    #[serde(rename = "v")]
    pub volume: String,

    /// Whether this candle is closed.
    #[serde(rename = "x")]
    pub is_final: bool,
}

// =============================================================================
// Book Ticker Stream
// =============================================================================

/// Best bid/ask update from the `@bookTicker` stream.
///
/// Book ticker frames carry no `e` event-type field; they are recognized by
/// this exact field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTickerMessage {
    /// Order book update ID.
    #[serde(rename = "u")]
    pub update_id: u64,

    /// Trading pair (upper-case).
    #[serde(rename = "s")]
    pub symbol: String,

    /// Best bid price (decimal string).
    #[serde(rename = "b")]
    pub best_bid: String,

    /// Best bid quantity (decimal string).
    #[serde(rename = "B")]
    pub best_bid_qty: String,

    /// Best ask price (decimal string).
    #[serde(rename = "a")]
    pub best_ask: String,

    /// Best ask quantity (decimal string).
    #[serde(rename = "A")]
    pub best_ask_qty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_covers_nine_streams() {
        let request = SubscribeRequest::for_symbols(&Symbol::all());
        assert_eq!(request.method, "SUBSCRIBE");
        assert_eq!(request.id, 1);
        assert_eq!(request.params.len(), 9);
        assert!(request.params.contains(&"ethusdt@trade".to_string()));
        assert!(request.params.contains(&"btcusdt@kline_1s".to_string()));
        assert!(request.params.contains(&"solusdt@bookTicker".to_string()));
        // Lower-case symbols only.
        assert!(request.params.iter().all(|p| p.starts_with(|c: char| c.is_ascii_lowercase())));
    }

    #[test]
    fn trade_message_deserializes() {
        let json = r#"{"e":"trade","E":1700000000100,"s":"ETHUSDT","t":991,
            "p":"2000.01","q":"0.5","b":1,"a":2,"T":1700000000099,"m":true,"M":true}"#;
        let msg: TradeMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.event_type, "trade");
        assert_eq!(msg.trade_id, 991);
        assert_eq!(msg.price, "2000.01");
        assert!(msg.is_buyer_maker);
    }

    #[test]
    fn kline_message_deserializes_nested_payload() {
        let json = r#"{"e":"kline","E":1700000001000,"s":"BTCUSDT","k":{
            "t":1700000000000,"T":1700000000999,"s":"BTCUSDT","i":"1s",
            "f":1,"L":2,"o":"42000.0","c":"42001.5","h":"42002.0","l":"41999.0",
            "v":"1.25","n":3,"x":false,"q":"52501.0","V":"0.5","Q":"21000.0","B":"0"}}"#;
        let msg: KlineMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kline.interval, "1s");
        assert_eq!(msg.kline.close, "42001.5");
        assert!(!msg.kline.is_final);
    }

    #[test]
    fn book_ticker_deserializes_without_event_type() {
        let json = r#"{"u":400900217,"s":"BTCUSDT","b":"25.35","B":"31.21","a":"25.36","A":"40.66"}"#;
        let msg: BookTickerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.update_id, 400_900_217);
        assert_eq!(msg.best_bid, "25.35");
        assert_eq!(msg.best_ask_qty, "40.66");
    }

    #[test]
    fn subscribe_ack_result_is_null_on_success() {
        let ack: SubscribeAck = serde_json::from_str(r#"{"result":null,"id":1}"#).unwrap();
        assert!(ack.result.is_none());
        assert_eq!(ack.id, 1);
    }
}
