//! Account and order flow integration tests.
//!
//! Exercise the snapshot poller and order gateway together against a mock
//! exchange: fetch a snapshot, validate an order against it, and verify the
//! reject-before-network contract.

use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_core::application::{OrderError, OrderGateway, OrderRequest, SnapshotPoller};
use dashboard_core::domain::account::{OrderSide, OrderType};
use dashboard_core::domain::market::Symbol;
use dashboard_core::infrastructure::binance::BinanceRestClient;
use dashboard_core::infrastructure::config::Credentials;

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn client(server: &MockServer) -> BinanceRestClient {
    BinanceRestClient::new(server.uri(), Credentials::new("key", "secret").unwrap()).unwrap()
}

fn allow_list() -> Vec<String> {
    vec!["USDT".to_string(), "ETH".to_string()]
}

async fn mount_account(server: &MockServer, usdt_free: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v3/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "canTrade": true,
            "balances": [
                {"asset": "USDT", "free": usdt_free, "locked": "0.0"},
                {"asset": "ETH", "free": "2.0", "locked": "0.0"}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/openOrders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn snapshot_then_affordable_order_goes_through() {
    let server = MockServer::start().await;
    mount_account(&server, "5000.0").await;
    Mock::given(method("POST"))
        .and(path("/api/v3/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "ETHUSDT",
            "orderId": 1001,
            "status": "NEW",
            "transactTime": 1_700_000_000_000_i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let poller = SnapshotPoller::new(client(&server), allow_list());
    poller.fetch_once().await.unwrap();
    let snapshot = poller.snapshot().unwrap();

    let gateway = OrderGateway::new(client(&server));
    let record = gateway
        .submit(
            OrderRequest {
                symbol: Symbol::Ethusdt,
                side: OrderSide::Buy,
                order_type: OrderType::Limit,
                quantity: dec("1"),
                price: Some(dec("2000")),
            },
            &snapshot.balances,
            None,
        )
        .await
        .unwrap();

    assert_eq!(record.order_id, 1001);
}

#[tokio::test]
async fn unaffordable_order_is_rejected_before_the_wire() {
    let server = MockServer::start().await;
    mount_account(&server, "50.0").await;

    let poller = SnapshotPoller::new(client(&server), allow_list());
    poller.fetch_once().await.unwrap();
    let snapshot = poller.snapshot().unwrap();
    let requests_after_snapshot = server.received_requests().await.unwrap().len();

    let gateway = OrderGateway::new(client(&server));
    let result = gateway
        .submit(
            OrderRequest {
                symbol: Symbol::Ethusdt,
                side: OrderSide::Buy,
                order_type: OrderType::Limit,
                quantity: dec("1"),
                price: Some(dec("100")),
            },
            &snapshot.balances,
            None,
        )
        .await;

    assert!(matches!(result, Err(OrderError::Validation(_))));
    // No order request ever left the gateway.
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        requests_after_snapshot
    );
}

#[tokio::test]
async fn refetch_after_fill_replaces_the_snapshot() {
    let server = MockServer::start().await;
    mount_account(&server, "5000.0").await;

    let poller = SnapshotPoller::new(client(&server), allow_list());
    poller.fetch_once().await.unwrap();
    let before = poller.snapshot().unwrap();
    assert_eq!(before.balances[0].free, "5000.0");

    // The exchange reports a new balance after a fill.
    server.reset().await;
    mount_account(&server, "3000.0").await;

    poller.fetch_once().await.unwrap();
    let after = poller.snapshot().unwrap();
    assert_eq!(after.balances[0].free, "3000.0");
    assert!(after.fetched_at_ms >= before.fetched_at_ms);
}
