pub mod display;
pub mod input;

use std::io::{self, Write};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;

use crate::config::{Credentials, API_KEY_ENV, API_SECRET_ENV};
use crate::error::{BotError, ErrorKind};
use crate::exchange::FuturesExchange;
use crate::trading::FuturesBot;
use crate::types::OrderSide;

pub use input::{LineSource, Prompter, StdinLines};

const SYMBOL_PROMPT: &str = "Enter symbol (e.g., BTCUSDT): ";
const SIDE_PROMPT: &str = "Enter side (BUY/SELL): ";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("operation cancelled by user")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Bot(#[from] BotError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AccountInfo,
    CurrentPrice,
    MarketOrder,
    LimitOrder,
    StopLimitOrder,
    OrderStatus,
    CancelOrder,
    OpenOrders,
    Exit,
}

impl MenuAction {
    pub fn from_choice(choice: u32) -> Option<Self> {
        Some(match choice {
            1 => MenuAction::AccountInfo,
            2 => MenuAction::CurrentPrice,
            3 => MenuAction::MarketOrder,
            4 => MenuAction::LimitOrder,
            5 => MenuAction::StopLimitOrder,
            6 => MenuAction::OrderStatus,
            7 => MenuAction::CancelOrder,
            8 => MenuAction::OpenOrders,
            9 => MenuAction::Exit,
            _ => return None,
        })
    }

    fn describe(&self) -> &'static str {
        match self {
            MenuAction::AccountInfo => "getting account info",
            MenuAction::CurrentPrice => "getting price",
            MenuAction::MarketOrder => "placing market order",
            MenuAction::LimitOrder => "placing limit order",
            MenuAction::StopLimitOrder => "placing stop-limit order",
            MenuAction::OrderStatus => "getting order status",
            MenuAction::CancelOrder => "cancelling order",
            MenuAction::OpenOrders => "getting open orders",
            MenuAction::Exit => "exiting",
        }
    }
}

/// Asks for key and secret when neither the environment nor `.env` provided them.
pub async fn prompt_credentials<I, W>(
    prompter: &mut Prompter<I, W>,
) -> Result<Credentials, ShellError>
where
    I: LineSource,
    W: Write,
{
    let out = prompter.out();
    writeln!(out, "\nAPI credentials not found in environment variables.")?;
    writeln!(out, "Please create a .env file with the following content:")?;
    writeln!(out, "{}=your_api_key_here", API_KEY_ENV)?;
    writeln!(out, "{}=your_api_secret_here", API_SECRET_ENV)?;
    writeln!(out, "\nAlternatively, enter them now:")?;

    let api_key: String = prompter
        .ask_checked("Enter your Binance API Key: ", |s: &String| !s.is_empty())
        .await?;
    let api_secret: String = prompter
        .ask_checked("Enter your Binance API Secret: ", |s: &String| !s.is_empty())
        .await?;

    Ok(Credentials::new(api_key, api_secret))
}

/// The numbered menu loop.
pub struct Shell<E, I, W> {
    bot: FuturesBot<E>,
    prompter: Prompter<I, W>,
}

impl<E, I, W> Shell<E, I, W>
where
    E: FuturesExchange,
    I: LineSource,
    W: Write,
{
    pub fn new(bot: FuturesBot<E>, prompter: Prompter<I, W>) -> Self {
        Self { bot, prompter }
    }

    pub fn bot(&self) -> &FuturesBot<E> {
        &self.bot
    }

    pub fn output(&self) -> &W {
        self.prompter.output()
    }

    /// Runs until Exit is chosen or the menu prompt is interrupted.
    pub async fn run(&mut self) -> Result<(), ShellError> {
        loop {
            write!(self.prompter.out(), "{}", display::menu())?;

            let choice: u32 = match self.prompter.ask("Enter your choice (1-9): ").await {
                Ok(choice) => choice,
                Err(ShellError::Cancelled) => {
                    writeln!(self.prompter.out(), "\n\nExiting application...")?;
                    break;
                }
                Err(e) => return Err(e),
            };

            let action = match MenuAction::from_choice(choice) {
                Some(MenuAction::Exit) => {
                    writeln!(
                        self.prompter.out(),
                        "Thank you for using Binance Futures Trading Bot!"
                    )?;
                    break;
                }
                Some(action) => action,
                None => {
                    writeln!(
                        self.prompter.out(),
                        "Invalid choice. Please select a number between 1 and 9."
                    )?;
                    continue;
                }
            };

            match self.perform(action).await {
                Ok(()) => {}
                Err(ShellError::Cancelled) => {
                    writeln!(self.prompter.out(), "\nOperation cancelled by user.")?;
                }
                Err(ShellError::Bot(e)) => self.report(action, &e)?,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn report(&mut self, action: MenuAction, err: &BotError) -> io::Result<()> {
        let out = self.prompter.out();
        match err.kind() {
            ErrorKind::Validation => writeln!(out, "❌ Invalid input {}: {}", action.describe(), err),
            ErrorKind::Exchange => writeln!(out, "❌ Exchange error {}: {}", action.describe(), err),
            ErrorKind::Unexpected => {
                error!(action = action.describe(), error = %err, "Unexpected error in main loop");
                writeln!(out, "❌ Unexpected error {}: {}", action.describe(), err)
            }
        }
    }

    async fn perform(&mut self, action: MenuAction) -> Result<(), ShellError> {
        match action {
            MenuAction::AccountInfo => {
                let account = self.bot.account_snapshot().await?;
                write!(self.prompter.out(), "{}", display::account_block(&account))?;
            }
            MenuAction::CurrentPrice => {
                let symbol = self.ask_symbol().await?;
                let price = self.bot.current_price(&symbol).await?;
                writeln!(
                    self.prompter.out(),
                    "\nCurrent price for {}: {}",
                    symbol.to_ascii_uppercase(),
                    display::format_price(price)
                )?;
            }
            MenuAction::MarketOrder => {
                writeln!(self.prompter.out(), "\n--- Place Market Order ---")?;
                let symbol = self.ask_symbol().await?;
                let side = self.ask_side().await?;
                let quantity = self.ask_positive("Enter quantity: ").await?;

                let order = self.bot.place_market_order(&symbol, &side, quantity).await?;
                self.placed("Market", order.order_id)?;
            }
            MenuAction::LimitOrder => {
                writeln!(self.prompter.out(), "\n--- Place Limit Order ---")?;
                let symbol = self.ask_symbol().await?;
                let side = self.ask_side().await?;
                let quantity = self.ask_positive("Enter quantity: ").await?;
                let price = self.ask_positive("Enter limit price: ").await?;

                let order = self
                    .bot
                    .place_limit_order(&symbol, &side, quantity, price)
                    .await?;
                self.placed("Limit", order.order_id)?;
            }
            MenuAction::StopLimitOrder => {
                writeln!(self.prompter.out(), "\n--- Place Stop-Limit Order ---")?;
                let symbol = self.ask_symbol().await?;
                let side = self.ask_side().await?;
                let quantity = self.ask_positive("Enter quantity: ").await?;
                let stop_price = self.ask_positive("Enter stop price: ").await?;
                let limit_price = self.ask_positive("Enter limit price: ").await?;

                let order = self
                    .bot
                    .place_stop_limit_order(&symbol, &side, quantity, stop_price, limit_price)
                    .await?;
                self.placed("Stop-limit", order.order_id)?;
            }
            MenuAction::OrderStatus => {
                let symbol = self.ask_symbol().await?;
                let order_id: i64 = self.prompter.ask("Enter order ID: ").await?;

                let order = self.bot.order_status(&symbol, order_id).await?;
                write!(self.prompter.out(), "{}", display::order_block(&order))?;
            }
            MenuAction::CancelOrder => {
                let symbol = self.ask_symbol().await?;
                let order_id: i64 = self.prompter.ask("Enter order ID to cancel: ").await?;

                self.bot.cancel_order(&symbol, order_id).await?;
                writeln!(
                    self.prompter.out(),
                    "✅ Order {} cancelled successfully!",
                    order_id
                )?;
            }
            MenuAction::OpenOrders => {
                let symbol: String = self
                    .prompter
                    .ask("Enter symbol (optional, press Enter for all): ")
                    .await?;

                let orders = self.bot.open_orders(Some(&symbol)).await?;
                write!(self.prompter.out(), "{}", display::open_orders_block(&orders))?;
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }

    fn placed(&mut self, kind: &str, order_id: i64) -> io::Result<()> {
        let out = self.prompter.out();
        writeln!(out, "✅ {} order placed successfully!", kind)?;
        writeln!(out, "Order ID: {}", order_id)
    }

    async fn ask_symbol(&mut self) -> Result<String, ShellError> {
        self.prompter
            .ask_checked(SYMBOL_PROMPT, |s: &String| !s.is_empty())
            .await
    }

    async fn ask_side(&mut self) -> Result<String, ShellError> {
        self.prompter
            .ask_checked(SIDE_PROMPT, |s: &String| s.parse::<OrderSide>().is_ok())
            .await
    }

    async fn ask_positive(&mut self, prompt: &str) -> Result<Decimal, ShellError> {
        self.prompter
            .ask_checked(prompt, |v: &Decimal| *v > Decimal::ZERO)
            .await
    }
}
