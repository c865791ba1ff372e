use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use super::FuturesExchange;
use crate::config::{Config, Credentials};
use crate::error::{BotError, BotResult};
use crate::types::{AccountSnapshot, Order, OrderRequest, OrderType};

const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PING: &str = "/fapi/v1/ping";
const ACCOUNT: &str = "/fapi/v2/account";
const TICKER_PRICE: &str = "/fapi/v1/ticker/price";
const ORDER: &str = "/fapi/v1/order";
const OPEN_ORDERS: &str = "/fapi/v1/openOrders";

// RFC 3986 unreserved characters stay literal.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type Params = BTreeMap<&'static str, String>;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Decimal,
}

/// REST client for the Binance USDT-M futures API.
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
    api_secret: String,
    recv_window: u64,
}

impl BinanceFuturesClient {
    pub fn new(
        credentials: &Credentials,
        base_url: impl Into<String>,
        recv_window: u64,
    ) -> BotResult<Self> {
        let api_key = HeaderValue::from_str(&credentials.api_key)
            .map_err(|_| BotError::Config("API key contains invalid characters".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_secret: credentials.api_secret.clone(),
            recv_window,
        })
    }

    pub fn from_config(config: &Config, credentials: &Credentials) -> BotResult<Self> {
        Self::new(credentials, config.rest_url(), config.recv_window)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Connectivity check; succeeds when the REST endpoint answers.
    pub async fn ping(&self) -> BotResult<()> {
        let _: serde_json::Value = self.send_public(PING, Params::new()).await?;
        Ok(())
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Adds `timestamp`/`recvWindow` and appends the signature over the encoded query.
    fn signed_query(&self, mut params: Params, timestamp: i64) -> String {
        params.insert("timestamp", timestamp.to_string());
        params.insert("recvWindow", self.recv_window.to_string());

        let query = encode_query(&params);
        let signature = self.sign(&query);
        format!("{}&signature={}", query, signature)
    }

    async fn send_public<T: DeserializeOwned>(&self, path: &str, params: Params) -> BotResult<T> {
        let url = if params.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, encode_query(&params))
        };

        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        read_response(response).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> BotResult<T> {
        debug!(%method, path, ?params, "signed request");

        let query = self.signed_query(params, Utc::now().timestamp_millis());
        let url = format!("{}{}?{}", self.base_url, path, query);

        let response = self.client.request(method, &url).send().await?;
        read_response(response).await
    }
}

#[async_trait]
impl FuturesExchange for BinanceFuturesClient {
    async fn account(&self) -> BotResult<AccountSnapshot> {
        let snapshot: AccountSnapshot = self.send_signed(Method::GET, ACCOUNT, Params::new()).await?;
        Ok(snapshot.with_open_positions_only())
    }

    async fn ticker_price(&self, symbol: &str) -> BotResult<Decimal> {
        let mut params = Params::new();
        params.insert("symbol", symbol.to_string());

        let ticker: TickerPrice = self.send_public(TICKER_PRICE, params).await?;
        Ok(ticker.price)
    }

    async fn place_order(&self, request: &OrderRequest) -> BotResult<Order> {
        self.send_signed(Method::POST, ORDER, order_params(request)).await
    }

    async fn query_order(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
        self.send_signed(Method::GET, ORDER, order_ref(symbol, order_id)).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
        self.send_signed(Method::DELETE, ORDER, order_ref(symbol, order_id)).await
    }

    async fn open_orders(&self, symbol: Option<&str>) -> BotResult<Vec<Order>> {
        let mut params = Params::new();
        if let Some(symbol) = symbol {
            params.insert("symbol", symbol.to_string());
        }
        self.send_signed(Method::GET, OPEN_ORDERS, params).await
    }
}

async fn read_response<T: DeserializeOwned>(response: Response) -> BotResult<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), %body, "response");

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => BotError::Api {
                code: err.code,
                message: err.msg,
            },
            Err(_) => BotError::Http {
                status: status.as_u16(),
                body,
            },
        });
    }

    serde_json::from_str(&body).map_err(|e| BotError::Decode(format!("{} - body: {}", e, body)))
}

fn encode_query(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_VALUE)))
        .collect::<Vec<String>>()
        .join("&")
}

fn order_ref(symbol: &str, order_id: i64) -> Params {
    let mut params = Params::new();
    params.insert("symbol", symbol.to_string());
    params.insert("orderId", order_id.to_string());
    params
}

fn order_params(request: &OrderRequest) -> Params {
    let mut params = Params::new();
    params.insert("symbol", request.symbol.clone());
    params.insert("side", request.side.as_str().to_string());
    params.insert("type", request.order_type.as_str().to_string());
    params.insert("quantity", request.quantity.normalize().to_string());

    if let Some(price) = request.price {
        params.insert("price", price.normalize().to_string());
    }
    if let Some(stop_price) = request.stop_price {
        params.insert("stopPrice", stop_price.normalize().to_string());
    }
    if let Some(tif) = request.time_in_force {
        params.insert("timeInForce", tif.as_str().to_string());
    }
    // market fills are reported in the placement response
    if request.order_type == OrderType::Market {
        params.insert("newOrderRespType", "RESULT".to_string());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use std::str::FromStr;

    fn client(secret: &str) -> BinanceFuturesClient {
        BinanceFuturesClient::new(
            &Credentials::new("test-key", secret),
            "https://testnet.binancefuture.com/",
            5000,
        )
        .unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_signature_matches_documented_vector() {
        let client = client("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j");
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            client.sign(payload),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_appends_signature_last() {
        let client = client("secret");
        let query = client.signed_query(order_ref("BTCUSDT", 42), 1_700_000_000_000);

        let (unsigned, signature) = query.rsplit_once("&signature=").unwrap();
        assert_eq!(
            unsigned,
            "orderId=42&recvWindow=5000&symbol=BTCUSDT&timestamp=1700000000000"
        );
        assert_eq!(signature, client.sign(unsigned));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        assert_eq!(client("s").base_url(), "https://testnet.binancefuture.com");
    }

    #[test]
    fn test_encode_query_escapes_reserved_characters() {
        let mut params = Params::new();
        params.insert("symbol", "BTC USDT&x=1".to_string());
        params.insert("quantity", "0.01".to_string());
        assert_eq!(encode_query(&params), "quantity=0.01&symbol=BTC%20USDT%26x%3D1");
    }

    #[test]
    fn test_market_order_params() {
        let params = order_params(&OrderRequest::market("BTCUSDT", OrderSide::Buy, dec("0.010")));
        assert_eq!(params.get("type").map(String::as_str), Some("MARKET"));
        assert_eq!(params.get("side").map(String::as_str), Some("BUY"));
        assert_eq!(params.get("quantity").map(String::as_str), Some("0.01"));
        assert_eq!(params.get("newOrderRespType").map(String::as_str), Some("RESULT"));
        assert!(!params.contains_key("price"));
        assert!(!params.contains_key("timeInForce"));
    }

    #[test]
    fn test_stop_limit_order_params() {
        let request =
            OrderRequest::stop_limit("ETHUSDT", OrderSide::Sell, dec("1"), dec("3000"), dec("2990.5"));
        let params = order_params(&request);
        assert_eq!(params.get("type").map(String::as_str), Some("STOP"));
        assert_eq!(params.get("price").map(String::as_str), Some("2990.5"));
        assert_eq!(params.get("stopPrice").map(String::as_str), Some("3000"));
        assert_eq!(params.get("timeInForce").map(String::as_str), Some("GTC"));
        assert!(!params.contains_key("newOrderRespType"));
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let result = BinanceFuturesClient::new(&Credentials::new("bad\nkey", "s"), "http://x", 5000);
        assert!(matches!(result, Err(BotError::Config(_))));
    }
}
