//! Autotrader CLI - drive the paper-trading account from the command line.
//!
//! Every command prints one JSON `ApiResponse` on stdout. Logs go to stderr
//! and, when configured, to an append-only log file.

use autotrader_core::tools::{DisabledSearch, OpenAiSearch, SearchProvider, ToolOutput};
use autotrader_core::{
    create_default_registry, ApiResponse, Config, FallbackOracle, ToolInput, ToolRegistry,
    TradingDesk,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "autotrader")]
#[command(about = "Autotrader CLI - paper-trading ledger, valuation and agent tools")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger with seed cash
    Init {
        /// Starting cash (defaults to seed_cash from config)
        #[arg(long)]
        cash: Option<f64>,
        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },
    /// Show cash, holdings and trade history
    Portfolio,
    /// Show net worth and annualized return
    NetWorth,
    /// Look up the current price of a ticker
    Price {
        /// Stock ticker symbol
        ticker: String,
    },
    /// Buy shares at the current price
    Buy {
        /// Stock ticker symbol
        ticker: String,
        /// Number of shares
        shares: f64,
    },
    /// Sell shares at the current price
    Sell {
        /// Stock ticker symbol
        ticker: String,
        /// Number of shares
        shares: f64,
    },
    /// Portfolio report with recent trades
    Report,
    /// List available agent tools and their parameter schemas
    Tools,
    /// Run a single agent tool
    Call {
        /// Tool name
        tool: String,
        /// JSON object of parameters
        #[arg(default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config)?;

    let response = match run(cli.command, &config).await {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::err(e.to_string()),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let file_layer = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<Value> {
    match command {
        Commands::Init { cash, force } => {
            let store = config.store();
            let ledger = store.seed(cash.unwrap_or(config.seed_cash), force)?;
            Ok(json!({
                "path": store.path(),
                "cash": ledger.cash(),
            }))
        }
        Commands::Portfolio => call(config, "get_portfolio", Value::Null).await,
        Commands::NetWorth => call(config, "get_net_worth", Value::Null).await,
        Commands::Price { ticker } => {
            call(config, "get_stock_price", json!({ "ticker": ticker })).await
        }
        Commands::Buy { ticker, shares } => {
            call(config, "buy", json!({ "ticker": ticker, "shares": shares })).await
        }
        Commands::Sell { ticker, shares } => {
            call(config, "sell", json!({ "ticker": ticker, "shares": shares })).await
        }
        Commands::Report => {
            let report = open_desk(config)?
                .report(Utc::now(), config.recent_trades)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Tools => {
            // Schemas only: leave the ledger file alone
            let registry = registry_for(desk(config)?, config)?;
            Ok(json!({ "tools": registry.definitions() }))
        }
        Commands::Call { tool, params } => {
            let params: Value = serde_json::from_str(&params)?;
            call(config, &tool, params).await
        }
    }
}

fn desk(config: &Config) -> anyhow::Result<TradingDesk> {
    let oracle = FallbackOracle::from_config(config)?;
    tracing::debug!(sources = ?oracle.source_names(), "Price oracle ready");
    Ok(TradingDesk::new(
        config.store(),
        Arc::new(oracle),
        config.start_value,
    ))
}

/// Desk over the configured ledger, seeding it on first use.
fn open_desk(config: &Config) -> anyhow::Result<TradingDesk> {
    let desk = desk(config)?;
    desk.store().load_or_seed(config.seed_cash)?;
    Ok(desk)
}

fn registry_for(desk: TradingDesk, config: &Config) -> anyhow::Result<ToolRegistry> {
    let search: Arc<dyn SearchProvider> = match OpenAiSearch::from_config(config)? {
        Some(provider) => Arc::new(provider),
        None => Arc::new(DisabledSearch),
    };
    Ok(create_default_registry(desk, search))
}

async fn call(config: &Config, tool: &str, params: Value) -> anyhow::Result<Value> {
    let output: ToolOutput = registry_for(open_desk(config)?, config)?
        .dispatch(&ToolInput::new(tool, params))
        .await?;
    if output.success {
        Ok(output.data)
    } else {
        let message = output
            .error
            .unwrap_or_else(|| format!("{} was rejected", tool));
        anyhow::bail!(message)
    }
}
