use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::error::{BotError, BotResult, Field, ValidationError};
use crate::exchange::FuturesExchange;
use crate::types::{AccountSnapshot, Order, OrderRequest, OrderSide};

/// Validates user input, forwards to the exchange and logs each call.
pub struct FuturesBot<E> {
    exchange: E,
}

impl<E: FuturesExchange> FuturesBot<E> {
    pub fn new(exchange: E) -> Self {
        Self { exchange }
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    pub async fn account_snapshot(&self) -> BotResult<AccountSnapshot> {
        let result = self.exchange.account().await;
        match &result {
            Ok(snapshot) => info!(
                positions = snapshot.positions.len(),
                "Account information retrieved successfully"
            ),
            Err(e) => error!(error = %e, "Error getting account info"),
        }
        result
    }

    pub async fn current_price(&self, symbol: &str) -> BotResult<Decimal> {
        let symbol = normalize_symbol(symbol).map_err(|e| rejected("price lookup", e))?;

        let result = self.exchange.ticker_price(&symbol).await;
        match &result {
            Ok(price) => info!(%symbol, %price, "Current price retrieved"),
            Err(e) => error!(%symbol, error = %e, "Error getting price"),
        }
        result
    }

    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: Decimal,
    ) -> BotResult<Order> {
        let (symbol, side) = validate_order(symbol, side, quantity)
            .map_err(|e| rejected("market order", e))?;

        let request = OrderRequest::market(&symbol, side, quantity);
        self.submit("Market", request).await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> BotResult<Order> {
        let (symbol, side) = validate_order(symbol, side, quantity)
            .and_then(|parsed| positive(Field::Price, price).map(|_| parsed))
            .map_err(|e| rejected("limit order", e))?;

        let request = OrderRequest::limit(&symbol, side, quantity, price);
        self.submit("Limit", request).await
    }

    pub async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> BotResult<Order> {
        let (symbol, side) = validate_order(symbol, side, quantity)
            .and_then(|parsed| positive(Field::StopPrice, stop_price).map(|_| parsed))
            .and_then(|parsed| positive(Field::LimitPrice, limit_price).map(|_| parsed))
            .map_err(|e| rejected("stop-limit order", e))?;

        let request = OrderRequest::stop_limit(&symbol, side, quantity, stop_price, limit_price);
        self.submit("Stop-limit", request).await
    }

    pub async fn order_status(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
        let symbol = normalize_symbol(symbol).map_err(|e| rejected("order status", e))?;

        let result = self.exchange.query_order(&symbol, order_id).await;
        match &result {
            Ok(order) => info!(order_id, status = %order.status, "Order status retrieved"),
            Err(e) => error!(%symbol, order_id, error = %e, "Error getting order status"),
        }
        result
    }

    pub async fn cancel_order(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
        let symbol = normalize_symbol(symbol).map_err(|e| rejected("cancel", e))?;

        let result = self.exchange.cancel_order(&symbol, order_id).await;
        match &result {
            Ok(_) => info!(%symbol, order_id, "Order cancelled successfully"),
            Err(e) => error!(%symbol, order_id, error = %e, "Error cancelling order"),
        }
        result
    }

    /// All open orders, or only `symbol`'s when given; a blank filter means all.
    pub async fn open_orders(&self, symbol: Option<&str>) -> BotResult<Vec<Order>> {
        let symbol = symbol
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase);

        let result = self.exchange.open_orders(symbol.as_deref()).await;
        match &result {
            Ok(orders) => info!(count = orders.len(), symbol = ?symbol, "Retrieved open orders"),
            Err(e) => error!(symbol = ?symbol, error = %e, "Error getting open orders"),
        }
        result
    }

    async fn submit(&self, kind: &str, request: OrderRequest) -> BotResult<Order> {
        let result = self.exchange.place_order(&request).await;
        match &result {
            Ok(order) => info!(
                kind,
                side = %request.side,
                quantity = %request.quantity,
                symbol = %request.symbol,
                price = ?request.price,
                stop_price = ?request.stop_price,
                order_id = order.order_id,
                "Order placed"
            ),
            Err(e) => error!(kind, symbol = %request.symbol, error = %e, "Error placing order"),
        }
        result
    }
}

fn rejected(operation: &str, err: ValidationError) -> BotError {
    warn!(operation, field = %err.field, reason = %err.reason, "Invalid input");
    err.into()
}

fn normalize_symbol(symbol: &str) -> Result<String, ValidationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::new(Field::Symbol, "must not be empty"));
    }
    Ok(symbol.to_ascii_uppercase())
}

fn positive(field: Field, value: Decimal) -> Result<(), ValidationError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("must be positive, got {}", value)))
    }
}

fn validate_order(
    symbol: &str,
    side: &str,
    quantity: Decimal,
) -> Result<(String, OrderSide), ValidationError> {
    let side: OrderSide = side.parse()?;
    positive(Field::Quantity, quantity)?;
    let symbol = normalize_symbol(symbol)?;
    Ok((symbol, side))
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::error::{BotError, BotResult};
    use crate::exchange::FuturesExchange;
    use crate::types::{AccountSnapshot, Order, OrderRequest, OrderStatus};

    /// In-memory exchange that records every call it receives.
    #[derive(Default)]
    pub struct MockExchange {
        pub calls: AtomicUsize,
        pub orders: Mutex<Vec<Order>>,
        pub last_request: Mutex<Option<OrderRequest>>,
        pub last_filter: Mutex<Option<Option<String>>>,
        pub account: Option<AccountSnapshot>,
        pub price: Option<Decimal>,
    }

    impl MockExchange {
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn unknown_order() -> BotError {
            BotError::Api {
                code: -2011,
                message: "Unknown order sent.".to_string(),
            }
        }
    }

    #[async_trait]
    impl FuturesExchange for MockExchange {
        async fn account(&self) -> BotResult<AccountSnapshot> {
            self.hit();
            self.account
                .clone()
                .map(AccountSnapshot::with_open_positions_only)
                .ok_or_else(|| BotError::Decode("no account".to_string()))
        }

        async fn ticker_price(&self, _symbol: &str) -> BotResult<Decimal> {
            self.hit();
            self.price.ok_or_else(|| BotError::Api {
                code: -1121,
                message: "Invalid symbol.".to_string(),
            })
        }

        async fn place_order(&self, request: &OrderRequest) -> BotResult<Order> {
            self.hit();
            *self.last_request.lock().unwrap() = Some(request.clone());

            let mut orders = self.orders.lock().unwrap();
            let order = Order {
                order_id: 1000 + orders.len() as i64,
                symbol: request.symbol.clone(),
                side: request.side,
                order_type: request.order_type,
                status: OrderStatus::New,
                quantity: request.quantity,
                executed_qty: Decimal::ZERO,
                price: request.price.unwrap_or_default(),
                stop_price: request.stop_price,
                avg_price: Decimal::ZERO,
                time: Some(1_700_000_000_000),
                update_time: Some(1_700_000_000_000),
            };
            orders.push(order.clone());
            Ok(order)
        }

        async fn query_order(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
            self.hit();
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.order_id == order_id && o.symbol == symbol)
                .cloned()
                .ok_or_else(Self::unknown_order)
        }

        async fn cancel_order(&self, symbol: &str, order_id: i64) -> BotResult<Order> {
            self.hit();
            let mut orders = self.orders.lock().unwrap();
            let pos = orders
                .iter()
                .position(|o| o.order_id == order_id && o.symbol == symbol)
                .ok_or_else(Self::unknown_order)?;
            let mut order = orders.remove(pos);
            order.status = OrderStatus::Canceled;
            Ok(order)
        }

        async fn open_orders(&self, symbol: Option<&str>) -> BotResult<Vec<Order>> {
            self.hit();
            *self.last_filter.lock().unwrap() = Some(symbol.map(str::to_string));
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| symbol.map_or(true, |s| o.symbol == s))
                .cloned()
                .collect())
        }
    }
}
