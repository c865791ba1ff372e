//! Shared fixtures for the REST client tests.

use futures_trading_bot::{BinanceFuturesClient, Credentials};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";

pub async fn setup() -> (MockServer, BinanceFuturesClient) {
    let server = MockServer::start().await;
    let client = BinanceFuturesClient::new(&Credentials::new(API_KEY, API_SECRET), server.uri(), 5000)
        .expect("client should build");
    (server, client)
}

/// Order document shaped like `/fapi/v1/order` responses.
pub fn order_json(order_id: i64, symbol: &str, side: &str, order_type: &str, status: &str, qty: &str) -> Value {
    json!({
        "orderId": order_id,
        "symbol": symbol,
        "status": status,
        "clientOrderId": "web_abc123",
        "price": "0",
        "avgPrice": "0.00",
        "origQty": qty,
        "executedQty": "0",
        "cumQty": "0",
        "cumQuote": "0",
        "timeInForce": "GTC",
        "type": order_type,
        "reduceOnly": false,
        "closePosition": false,
        "side": side,
        "positionSide": "BOTH",
        "stopPrice": "0",
        "workingType": "CONTRACT_PRICE",
        "priceProtect": false,
        "origType": order_type,
        "updateTime": 1700000000000i64
    })
}

pub fn api_error(code: i64, msg: &str) -> Value {
    json!({ "code": code, "msg": msg })
}
