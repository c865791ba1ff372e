pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod shell;
pub mod trading;
pub mod types;

pub use config::{Config, Credentials, Network};
pub use error::{BotError, BotResult, ErrorKind, Field, ValidationError};
pub use exchange::binance::BinanceFuturesClient;
pub use exchange::FuturesExchange;
pub use trading::FuturesBot;
