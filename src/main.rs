use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};

use futures_trading_bot::config::{Config, Network};
use futures_trading_bot::shell::{self, Prompter, Shell, ShellError, StdinLines};
use futures_trading_bot::{BinanceFuturesClient, FuturesBot};

#[derive(Parser, Debug)]
#[command(
    name = "futures_trading_bot",
    version,
    about = "Interactive Binance USDT-M futures trading client"
)]
struct Cli {
    /// Trade on the live exchange instead of the testnet
    #[arg(long)]
    live: bool,
    /// Override the REST base URL
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,
    /// Signed request validity window in milliseconds
    #[arg(long = "recv-window", value_name = "MS")]
    recv_window: Option<u64>,
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if self.live {
            config.network = Network::Live;
        }
        if let Some(url) = self.base_url {
            config.base_url = Some(url);
        }
        if let Some(window) = self.recv_window {
            config.recv_window = window;
        }
        if let Some(path) = self.log_file {
            config.log_file = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let log_level = cli.log_level.clone();

    let mut config = Config::from_env().context("read configuration")?;
    cli.apply(&mut config);

    let _log_guard = futures_trading_bot::logging::init_logging(&log_level, &config.log_file)?;

    println!("Welcome to Binance Futures Trading Bot!");
    match config.network {
        Network::Testnet => {
            println!("This bot connects to Binance Futures Testnet for safe trading practice.")
        }
        Network::Live => println!("WARNING: connected to the LIVE exchange, orders use real funds."),
    }

    let mut prompter = Prompter::new(StdinLines::new(), io::stdout());

    let credentials = match config.credentials.clone() {
        Some(credentials) => credentials,
        None => match shell::prompt_credentials(&mut prompter).await {
            Ok(credentials) => credentials,
            Err(ShellError::Cancelled) => {
                println!("\nOperation cancelled by user.");
                return Ok(());
            }
            Err(e) => return Err(e).context("read credentials"),
        },
    };

    let client = BinanceFuturesClient::from_config(&config, &credentials)
        .context("build exchange client")?;

    if let Err(e) = client.ping().await {
        error!(url = client.base_url(), error = %e, "Failed to initialize Binance client");
        println!("Failed to connect to Binance: {}", e);
        return Err(e).context("connect to Binance Futures");
    }
    info!(url = client.base_url(), "Connected to Binance Futures {}", config.network);
    println!("✅ Successfully connected to Binance Futures {}!", config.network);

    let mut shell = Shell::new(FuturesBot::new(client), prompter);
    shell.run().await.context("menu loop")?;

    Ok(())
}
