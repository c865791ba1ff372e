pub mod binance;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::BotResult;
use crate::types::{AccountSnapshot, Order, OrderRequest};

/// One authenticated round trip per call; no retries.
#[async_trait]
pub trait FuturesExchange: Send + Sync {
    async fn account(&self) -> BotResult<AccountSnapshot>;
    async fn ticker_price(&self, symbol: &str) -> BotResult<Decimal>;
    async fn place_order(&self, request: &OrderRequest) -> BotResult<Order>;
    async fn query_order(&self, symbol: &str, order_id: i64) -> BotResult<Order>;
    async fn cancel_order(&self, symbol: &str, order_id: i64) -> BotResult<Order>;
    async fn open_orders(&self, symbol: Option<&str>) -> BotResult<Vec<Order>>;
}
