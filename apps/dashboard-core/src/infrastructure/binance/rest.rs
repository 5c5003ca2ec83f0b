//! Signed REST Client
//!
//! Thin client over the exchange's authenticated REST API. Every call is
//! single-shot: the account poller and the order gateway surface failures to
//! their callers instead of retrying here, so a transient error never turns
//! into a burst of signed requests.
//!
//! # Authentication
//!
//! The API key travels in the `X-MBX-APIKEY` header. All parameters travel in
//! the query string (including for POST and DELETE), signed as described in
//! [`super::signing`].

use chrono::Utc;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::signing::{QueryParams, SigningError, signed_query};
use crate::domain::account::{AccountBalance, NewOrder, OrderRecord};
use crate::domain::market::Symbol;
use crate::infrastructure::config::Credentials;

// =============================================================================
// Error Type
// =============================================================================

/// Errors from the REST client.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Request could not be sent or the response body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The exchange answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually `{"code":...,"msg":...}`.
        body: String,
    },

    /// The response body did not deserialize as the expected type.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Signature computation failed.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

// =============================================================================
// Wire Types
// =============================================================================

/// Response of `GET /api/v3/account`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Whether the account may trade.
    #[serde(default)]
    pub can_trade: bool,
    /// Server-side time of the snapshot, epoch milliseconds.
    #[serde(default)]
    pub update_time: i64,
    /// All asset balances, zero or not.
    pub balances: Vec<AccountBalance>,
}

/// Optional filters for the order-history endpoint.
///
/// With the default (no filters) the exchange returns its standard page of
/// most-recent orders for the symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderHistoryQuery {
    /// Maximum number of records to return.
    pub limit: Option<u32>,
    /// Return orders with an ID at or after this one.
    pub order_id: Option<u64>,
    /// Inclusive lower bound on order time, epoch milliseconds.
    pub start_time: Option<i64>,
    /// Inclusive upper bound on order time, epoch milliseconds.
    pub end_time: Option<i64>,
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated REST client bound to one credential pair.
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl BinanceRestClient {
    /// Create a client for the given base URL and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Network`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| RestError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Fetch the full account snapshot, balances included.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn account(&self) -> Result<AccountInfo, RestError> {
        self.signed_request(Method::GET, "/api/v3/account", QueryParams::new())
            .await
    }

    /// Fetch open orders, optionally narrowed to one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn open_orders(&self, symbol: Option<Symbol>) -> Result<Vec<OrderRecord>, RestError> {
        let params = QueryParams::new().push_opt("symbol", symbol.map(|s| s.as_str()));
        self.signed_request(Method::GET, "/api/v3/openOrders", params)
            .await
    }

    /// Cancel all open orders on one symbol. Returns the cancelled records.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn cancel_open_orders(&self, symbol: Symbol) -> Result<Vec<OrderRecord>, RestError> {
        let params = QueryParams::new().push("symbol", symbol.as_str());
        self.signed_request(Method::DELETE, "/api/v3/openOrders", params)
            .await
    }

    /// Fetch the order history for one symbol, narrowed by `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn all_orders(
        &self,
        symbol: Symbol,
        query: OrderHistoryQuery,
    ) -> Result<Vec<OrderRecord>, RestError> {
        let params = QueryParams::new()
            .push("symbol", symbol.as_str())
            .push_opt("limit", query.limit)
            .push_opt("orderId", query.order_id)
            .push_opt("startTime", query.start_time)
            .push_opt("endTime", query.end_time);
        self.signed_request(Method::GET, "/api/v3/allOrders", params)
            .await
    }

    /// Submit a new order. The caller is expected to have validated it.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure. Rejections
    /// (insufficient balance, bad filters) surface as [`RestError::Api`].
    pub async fn place_order(&self, order: &NewOrder) -> Result<OrderRecord, RestError> {
        let params = QueryParams::new()
            .push("symbol", order.symbol.as_str())
            .push("side", order.side.as_str())
            .push("type", order.order_type.as_str())
            .push("quantity", order.quantity)
            .push_opt("price", order.price)
            .push_opt("timeInForce", order.time_in_force.map(|t| t.as_str()))
            .push_opt("newClientOrderId", order.new_client_order_id.as_deref());
        self.signed_request(Method::POST, "/api/v3/order", params)
            .await
    }

    /// Fetch one order by exchange ID.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn query_order(
        &self,
        symbol: Symbol,
        order_id: u64,
    ) -> Result<OrderRecord, RestError> {
        let params = QueryParams::new()
            .push("symbol", symbol.as_str())
            .push("orderId", order_id);
        self.signed_request(Method::GET, "/api/v3/order", params)
            .await
    }

    /// Cancel one order by exchange ID. Returns the cancelled record.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on network, API, or parse failure.
    pub async fn cancel_order(
        &self,
        symbol: Symbol,
        order_id: u64,
    ) -> Result<OrderRecord, RestError> {
        let params = QueryParams::new()
            .push("symbol", symbol.as_str())
            .push("orderId", order_id);
        self.signed_request(Method::DELETE, "/api/v3/order", params)
            .await
    }

    /// Sign and send one request, parsing the response as `T`.
    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: QueryParams,
    ) -> Result<T, RestError> {
        let timestamp = Utc::now().timestamp_millis();
        let query = signed_query(params, timestamp, self.credentials.api_secret())?;
        let url = format!("{}{path}?{query}", self.base_url);

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", self.credentials.api_key())
            .send()
            .await
            .map_err(|e| RestError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RestError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RestError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RestError::Parse(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::account::{OrderSide, OrderType, TimeInForce};

    fn test_credentials() -> Credentials {
        Credentials::new("test-key", "test-secret").unwrap()
    }

    fn query_pairs(url: &url::Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn account_request_is_signed_and_keyed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "canTrade": true,
                "updateTime": 1_700_000_000_000_i64,
                "balances": [
                    {"asset": "USDT", "free": "1000.0", "locked": "0.0"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        let info = client.account().await.unwrap();

        assert!(info.can_trade);
        assert_eq!(info.balances.len(), 1);
        assert_eq!(info.balances[0].asset, "USDT");

        let requests = server.received_requests().await.unwrap();
        let request = &requests[0];
        assert_eq!(
            request.headers.get("X-MBX-APIKEY").unwrap().to_str().unwrap(),
            "test-key"
        );

        let pairs = query_pairs(&request.url);
        // timestamp precedes the trailing signature.
        assert_eq!(pairs[pairs.len() - 2].0, "timestamp");
        assert_eq!(pairs[pairs.len() - 1].0, "signature");
        assert_eq!(pairs[pairs.len() - 1].1.len(), 64);
    }

    #[tokio::test]
    async fn place_order_serializes_in_declared_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "ETHUSDT",
                "orderId": 42,
                "transactTime": 1_700_000_000_000_i64,
                "status": "NEW"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = NewOrder {
            symbol: Symbol::Ethusdt,
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Decimal::new(5, 1),
            price: Some(Decimal::new(2000, 0)),
            time_in_force: Some(TimeInForce::Gtc),
            new_client_order_id: None,
        };

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        let record = client.place_order(&order).await.unwrap();
        assert_eq!(record.order_id, 42);
        assert_eq!(record.time, 1_700_000_000_000);

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0].url);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "symbol",
                "side",
                "type",
                "quantity",
                "price",
                "timeInForce",
                "timestamp",
                "signature"
            ]
        );
        assert_eq!(pairs[0].1, "ETHUSDT");
        assert_eq!(pairs[1].1, "BUY");
        assert_eq!(pairs[2].1, "LIMIT");
    }

    #[tokio::test]
    async fn market_order_omits_price_and_time_in_force() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BTCUSDT",
                "orderId": 7,
                "transactTime": 1_700_000_000_000_i64
            })))
            .mount(&server)
            .await;

        let order = NewOrder {
            symbol: Symbol::Btcusdt,
            side: OrderSide::Sell,
            order_type: OrderType::Market,
            quantity: Decimal::new(1, 2),
            price: None,
            time_in_force: None,
            new_client_order_id: None,
        };

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        client.place_order(&order).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0].url);
        assert!(pairs.iter().all(|(k, _)| k != "price"));
        assert!(pairs.iter().all(|(k, _)| k != "timeInForce"));
    }

    #[tokio::test]
    async fn api_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/account"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"code":-2014,"msg":"API-key format invalid."}"#),
            )
            .mount(&server)
            .await;

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        let err = client.account().await.unwrap_err();
        match err {
            RestError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("-2014"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_orders_without_symbol_sends_no_symbol_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/openOrders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        let orders = client.open_orders(None).await.unwrap();
        assert!(orders.is_empty());

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0].url);
        assert!(pairs.iter().all(|(k, _)| k != "symbol"));
    }

    #[tokio::test]
    async fn order_history_filters_pass_through_in_declared_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/allOrders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let query = OrderHistoryQuery {
            limit: Some(20),
            order_id: Some(500),
            start_time: Some(1_700_000_000_000),
            end_time: Some(1_700_000_100_000),
        };

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        client.all_orders(Symbol::Ethusdt, query).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0].url);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "symbol",
                "limit",
                "orderId",
                "startTime",
                "endTime",
                "timestamp",
                "signature"
            ]
        );
        assert_eq!(pairs[1].1, "20");
        assert_eq!(pairs[2].1, "500");
        assert_eq!(pairs[3].1, "1700000000000");
        assert_eq!(pairs[4].1, "1700000100000");
    }

    #[tokio::test]
    async fn order_history_defaults_send_only_the_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/allOrders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        client
            .all_orders(Symbol::Btcusdt, OrderHistoryQuery::default())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0].url);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["symbol", "timestamp", "signature"]);
        assert_eq!(pairs[0].1, "BTCUSDT");
    }

    #[tokio::test]
    async fn cancel_open_orders_uses_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v3/openOrders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"symbol": "SOLUSDT", "orderId": 9, "status": "CANCELED", "time": 1_i64}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = BinanceRestClient::new(server.uri(), test_credentials()).unwrap();
        let cancelled = client.cancel_open_orders(Symbol::Solusdt).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].status, "CANCELED");
    }
}
