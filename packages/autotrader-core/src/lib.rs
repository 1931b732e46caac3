//! Autotrader Core - ledger, valuation and tool surface for a paper-trading agent.
//!
//! This crate provides everything an external decision loop needs to trade a
//! simulated account:
//!
//! - **Ledger**: cash, per-ticker share counts and an append-only trade history
//! - **Persistence**: one JSON file, rewritten in full after every trade
//! - **Valuation**: holdings value, net worth and annualized return (CAGR)
//! - **Price oracles**: live quote sources with a fallback that never fails
//! - **Tools**: the callable operations exposed to a language-model driver
//!
//! # Example
//!
//! ```rust,no_run
//! use autotrader_core::{FixedPriceOracle, LedgerStore, TradingDesk};
//! use std::sync::Arc;
//!
//! # async fn run() -> autotrader_core::Result<()> {
//! let store = LedgerStore::new("portfolio.json");
//! store.load_or_seed(1000.0)?;
//!
//! let oracle = Arc::new(FixedPriceOracle::from_pairs([("AAPL", 100.0)]));
//! let desk = TradingDesk::new(store, oracle, 1000.0);
//!
//! let execution = desk.buy("AAPL", 2.0).await?;
//! println!("Cash left: ${:.2}", execution.cash);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod desk;
pub mod ledger;
pub mod oracle;
pub mod report;
pub mod tools;
pub mod types;
pub mod valuation;

// Re-export commonly used types
pub use config::Config;
pub use desk::{Direction, NetWorthSummary, PortfolioSummary, TradingDesk};
pub use ledger::{Execution, Ledger, LedgerStore};
pub use oracle::{
    FallbackOracle, FixedPriceOracle, PriceOracle, Quote, QuoteSource, StaticPriceTable,
};
pub use report::PortfolioReport;
pub use tools::{create_default_registry, Tool, ToolInput, ToolOutput, ToolRegistry};
pub use types::{ApiResponse, Trade, TradeSide};
pub use valuation::{
    annualized_return, holdings_value, net_worth, AnnualizedReturn, HoldingValue,
    HoldingsValuation,
};

/// Error types for autotrader-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Corrupt ledger state: {0}")]
    CorruptState(String),

    #[error("Ledger not initialized at {0}")]
    NotInitialized(String),

    #[error("Ledger already exists at {0}")]
    AlreadyInitialized(String),

    #[error("Insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds {
        needed: f64,
        available: f64,
        /// Quoted price per share
        price: f64,
    },

    #[error("Insufficient shares of {ticker}: requested {requested}, held {held}")]
    InsufficientShares {
        ticker: String,
        requested: f64,
        held: f64,
    },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Valuation error: {0}")]
    Valuation(String),

    #[error("Quote unavailable for {ticker}: {reason}")]
    QuoteUnavailable { ticker: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),
}

impl Error {
    /// Whether this error is an expected business-rule rejection rather than a fault.
    ///
    /// Rejections leave the ledger untouched and are reported to the driver as an
    /// ordinary unsuccessful result.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFunds { .. }
                | Error::InsufficientShares { .. }
                | Error::InvalidOrder(_)
        )
    }
}

/// Result type for autotrader-core operations.
pub type Result<T> = std::result::Result<T, Error>;
