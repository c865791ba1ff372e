use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BotError;

pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
pub const API_SECRET_ENV: &str = "BINANCE_API_SECRET";
pub const NETWORK_ENV: &str = "BINANCE_NETWORK";
pub const BASE_URL_ENV: &str = "BINANCE_FUTURES_URL";
pub const RECV_WINDOW_ENV: &str = "BINANCE_RECV_WINDOW";

pub const DEFAULT_RECV_WINDOW: u64 = 5000;
pub const DEFAULT_LOG_FILE: &str = "trading_bot.log";

const TESTNET_URL: &str = "https://testnet.binancefuture.com";
const LIVE_URL: &str = "https://fapi.binance.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Testnet,
    Live,
}

impl Network {
    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_URL,
            Network::Live => LIVE_URL,
        }
    }
}

impl FromStr for Network {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "live" | "mainnet" | "prod" => Ok(Network::Live),
            other => Err(BotError::Config(format!(
                "unknown network '{}', expected testnet or live",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => f.write_str("Testnet"),
            Network::Live => f.write_str("Live"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

// secret stays out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Option<Credentials>,
    pub network: Network,
    pub base_url: Option<String>,
    pub recv_window: u64,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            network: Network::Testnet,
            base_url: None,
            recv_window: DEFAULT_RECV_WINDOW,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let credentials = match (var(API_KEY_ENV), var(API_SECRET_ENV)) {
            (Some(key), Some(secret)) => Some(Credentials::new(key.trim(), secret.trim())),
            _ => None,
        };

        let network = match var(NETWORK_ENV) {
            Some(v) => v.parse()?,
            None => Network::default(),
        };

        let recv_window = match var(RECV_WINDOW_ENV) {
            Some(v) => v.trim().parse().map_err(|_| {
                BotError::Config(format!("{} must be milliseconds, got '{}'", RECV_WINDOW_ENV, v))
            })?,
            None => DEFAULT_RECV_WINDOW,
        };

        Ok(Self {
            credentials,
            network,
            base_url: var(BASE_URL_ENV),
            recv_window,
            ..Self::default()
        })
    }

    pub fn rest_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.network.base_url())
    }
}
