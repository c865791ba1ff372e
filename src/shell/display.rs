use std::fmt::Write;

use rust_decimal::Decimal;

use crate::types::{AccountSnapshot, Order};

const WIDE_RULE: usize = 50;
const ORDER_RULE: usize = 40;
const LIST_RULE: usize = 60;

pub fn menu() -> String {
    let rule = "=".repeat(WIDE_RULE);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "    BINANCE FUTURES TRADING BOT");
    let _ = writeln!(out, "{}", rule);
    for (i, label) in [
        "View Account Information",
        "Get Current Price",
        "Place Market Order",
        "Place Limit Order",
        "Place Stop-Limit Order",
        "Check Order Status",
        "Cancel Order",
        "View Open Orders",
        "Exit",
    ]
    .iter()
    .enumerate()
    {
        let _ = writeln!(out, "{}. {}", i + 1, label);
    }
    let _ = writeln!(out, "{}", rule);
    out
}

/// `1234567.891` -> `1,234,567.89`
pub fn group_thousands(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp(dp);
    rounded.rescale(dp);
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_usd(value: Decimal) -> String {
    dollars(value, 2)
}

/// Prices keep the exchange's precision, never fewer than two decimals.
pub fn format_price(value: Decimal) -> String {
    dollars(value, value.normalize().scale().max(2))
}

fn dollars(value: Decimal, dp: u32) -> String {
    let grouped = group_thousands(value, dp);
    match grouped.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", grouped),
    }
}

pub fn format_pnl(value: Decimal) -> String {
    let grouped = group_thousands(value, 2);
    if grouped.starts_with('-') {
        grouped
    } else {
        format!("+{}", grouped)
    }
}

pub fn account_block(account: &AccountSnapshot) -> String {
    let rule = "=".repeat(WIDE_RULE);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "           ACCOUNT INFORMATION");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Total Wallet Balance:    {}", format_usd(account.total_wallet_balance));
    let _ = writeln!(out, "Total Margin Balance:    {}", format_usd(account.total_margin_balance));
    let _ = writeln!(out, "Available Balance:       {}", format_usd(account.available_balance));
    let _ = writeln!(out, "Total Unrealized PnL:    {}", format_usd(account.total_unrealized_pnl));
    let _ = writeln!(out, "Max Withdraw Amount:     {}", format_usd(account.max_withdraw_amount));

    if account.positions.is_empty() {
        let _ = writeln!(out, "\nNo open positions.");
        return out;
    }

    let _ = writeln!(out, "\nCurrent Positions:");
    let _ = writeln!(out, "{}", "-".repeat(WIDE_RULE));
    for pos in &account.positions {
        let _ = writeln!(out, "Symbol: {}", pos.symbol);
        let _ = writeln!(out, "  Size: {}", pos.size);
        let _ = writeln!(out, "  Entry Price: {}", format_price(pos.entry_price));
        let _ = writeln!(out, "  Unrealized PnL: {}", format_pnl(pos.unrealized_pnl));
        match pos.percentage {
            Some(pct) => {
                let _ = writeln!(out, "  Percentage: {}%", pct);
            }
            None => {
                let _ = writeln!(out, "  Percentage: n/a");
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(30));
    }
    out
}

pub fn order_block(order: &Order) -> String {
    let rule = "=".repeat(ORDER_RULE);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "         ORDER DETAILS");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Order ID:        {}", order.order_id);
    let _ = writeln!(out, "Symbol:          {}", order.symbol);
    let _ = writeln!(out, "Side:            {}", order.side);
    let _ = writeln!(out, "Type:            {}", order.order_type);
    let _ = writeln!(out, "Status:          {}", order.status);
    let _ = writeln!(out, "Quantity:        {}", order.quantity);
    let _ = writeln!(out, "Executed Qty:    {}", order.executed_qty);
    let _ = writeln!(out, "Price:           {}", format_price(order.price));
    if let Some(stop) = order.trigger_price() {
        let _ = writeln!(out, "Stop Price:      {}", format_price(stop));
    }
    if order.avg_price > Decimal::ZERO {
        let _ = writeln!(out, "Average Price:   {}", format_price(order.avg_price));
    }
    let time = order
        .timestamp()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "Time:            {}", time);
    out
}

pub fn open_orders_block(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No open orders found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "\nOpen Orders ({} total):", orders.len());
    let _ = writeln!(out, "{}", "=".repeat(LIST_RULE));
    for order in orders {
        let mut line = format!(
            "ID: {} | {} | {} | {} | Qty: {} | Price: {}",
            order.order_id,
            order.symbol,
            order.side,
            order.order_type,
            order.quantity,
            format_price(order.price)
        );
        if let Some(stop) = order.trigger_price() {
            let _ = write!(line, " | Stop: {}", format_price(stop));
        }
        let _ = writeln!(out, "{} | Status: {}", line, order.status);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderSide, OrderStatus, OrderType, Position};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn order() -> Order {
        Order {
            order_id: 8389765,
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            status: OrderStatus::New,
            quantity: dec("0.010"),
            executed_qty: dec("0"),
            price: dec("65000.5"),
            stop_price: Some(dec("0")),
            avg_price: dec("0.00000"),
            time: Some(1_700_000_000_000),
            update_time: None,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(dec("0"), 2), "0.00");
        assert_eq!(group_thousands(dec("999.999"), 2), "1,000.00");
        assert_eq!(group_thousands(dec("1234567.891"), 2), "1,234,567.89");
        assert_eq!(group_thousands(dec("-12345.5"), 2), "-12,345.50");
        assert_eq!(group_thousands(dec("100000"), 0), "100,000");
    }

    #[test]
    fn test_money_formats() {
        assert_eq!(format_usd(dec("10000.00000000")), "$10,000.00");
        assert_eq!(format_usd(dec("-12.5")), "-$12.50");
        assert_eq!(format_price(dec("0.00001234")), "$0.00001234");
        assert_eq!(format_price(dec("65000.5")), "$65,000.50");
        assert_eq!(format_price(dec("1.0534")), "$1.0534");
        assert_eq!(format_price(dec("12345.678900")), "$12,345.6789");
        assert_eq!(format_price(dec("0.5")), "$0.50");
        assert_eq!(format_pnl(dec("4.2")), "+4.20");
        assert_eq!(format_pnl(dec("0")), "+0.00");
        assert_eq!(format_pnl(dec("-1000")), "-1,000.00");
    }

    #[test]
    fn test_order_block() {
        let text = order_block(&order());
        assert!(text.contains("Order ID:        8389765"));
        assert!(text.contains("Type:            LIMIT"));
        assert!(text.contains("Quantity:        0.010"));
        assert!(text.contains("Price:           $65,000.50"));
        assert!(text.contains("Time:            2023-11-14 22:13:20 UTC"));
        assert!(!text.contains("Stop Price"));
        assert!(!text.contains("Average Price"));
    }

    #[test]
    fn test_account_block_positions() {
        let mut account = AccountSnapshot {
            total_wallet_balance: dec("1500"),
            total_margin_balance: dec("1490.1"),
            available_balance: dec("1200"),
            total_unrealized_pnl: dec("-9.9"),
            max_withdraw_amount: dec("1200"),
            positions: vec![],
        };
        assert!(account_block(&account).contains("No open positions."));

        account.positions.push(Position {
            symbol: "ETHUSDT".to_string(),
            size: dec("-0.5"),
            entry_price: dec("3100"),
            unrealized_pnl: dec("-9.9"),
            percentage: None,
        });
        let text = account_block(&account);
        assert!(text.contains("Total Wallet Balance:    $1,500.00"));
        assert!(text.contains("Total Unrealized PnL:    -$9.90"));
        assert!(text.contains("  Size: -0.5"));
        assert!(text.contains("  Unrealized PnL: -9.90"));
        assert!(text.contains("  Percentage: n/a"));
    }

    #[test]
    fn test_open_orders_block() {
        assert_eq!(open_orders_block(&[]), "No open orders found.\n");
        let text = open_orders_block(&[order(), order()]);
        assert!(text.contains("Open Orders (2 total):"));
        assert_eq!(text.matches("ID: 8389765 | BTCUSDT | BUY | LIMIT").count(), 2);
        assert!(!text.contains("Stop:"));
    }

    #[test]
    fn test_open_orders_block_shows_trigger_and_scale() {
        let mut stop = order();
        stop.order_type = OrderType::Stop;
        stop.price = dec("1.0534");
        stop.stop_price = Some(dec("1.0500"));

        let text = open_orders_block(&[stop]);
        assert!(text.contains(
            "ID: 8389765 | BTCUSDT | BUY | STOP | Qty: 0.010 | Price: $1.0534 | Stop: $1.05 | Status: NEW"
        ));
    }

    #[test]
    fn test_menu_lists_nine_actions() {
        let menu = menu();
        assert!(menu.contains("1. View Account Information"));
        assert!(menu.contains("9. Exit"));
    }
}
