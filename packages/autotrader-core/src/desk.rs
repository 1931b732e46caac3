//! Typed trading operations over a ledger store and a price oracle.
//!
//! `TradingDesk` is what the tools call into. Prices for buy and sell are
//! fetched at call time, never supplied by the caller.

use crate::ledger::{Execution, LedgerStore};
use crate::oracle::{PriceOracle, Quote};
use crate::report::PortfolioReport;
use crate::types::{normalize_ticker, round_cents, round_shares, Trade};
use crate::valuation::{
    annualized_return_at, holdings_value, net_worth_from, AnnualizedReturn, QuoteFailure,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Cash, holdings and history as stored.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub cash: f64,
    pub holdings: BTreeMap<String, f64>,
    pub history: Vec<Trade>,
}

impl PortfolioSummary {
    /// Plain-text rendering for the language model.
    pub fn render(&self) -> String {
        let mut out = format!("Your cash balance is ${}.\nCurrent holdings:\n", self.cash);
        for (ticker, shares) in &self.holdings {
            let _ = writeln!(out, "  - {}: {} shares", ticker, shares);
        }
        out.push_str("\nTrade history:\n");
        for trade in &self.history {
            let _ = writeln!(out, "  - {}", trade.describe());
        }
        out.trim_end().to_string()
    }
}

/// Net worth relative to the starting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Point-in-time account value.
#[derive(Debug, Clone, Serialize)]
pub struct NetWorthSummary {
    pub net_worth: f64,
    pub cash: f64,
    pub holdings_value: f64,
    /// `None` when the computation failed; see `annualized_return_error`
    pub annualized_return: Option<AnnualizedReturn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_return_error: Option<String>,
    pub start_value: f64,
    pub direction: Direction,
    /// Absolute distance from the starting value
    pub change: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quote_failures: Vec<QuoteFailure>,
}

impl NetWorthSummary {
    pub fn render(&self) -> String {
        let annualized = match (&self.annualized_return, &self.annualized_return_error) {
            (Some(ret), _) => format!("{}%", ret),
            (None, Some(err)) => format!("unavailable ({})", err),
            (None, None) => "unavailable".to_string(),
        };
        let arrow = match self.direction {
            Direction::Up => "📈 Up",
            Direction::Down => "📉 Down",
        };
        format!(
            "Your current net worth is ${}\n\
             - Cash: ${}\n\
             - Holdings value: ${:.2}\n\
             - Annualized return: {} (started with ${:.2})\n\
             - {} ${:.2} from initial investment",
            self.net_worth,
            self.cash,
            self.holdings_value,
            annualized,
            self.start_value,
            arrow,
            self.change
        )
    }
}

/// Entry point for every agent-facing operation.
#[derive(Clone)]
pub struct TradingDesk {
    store: LedgerStore,
    oracle: Arc<dyn PriceOracle>,
    start_value: f64,
}

impl TradingDesk {
    pub fn new(store: LedgerStore, oracle: Arc<dyn PriceOracle>, start_value: f64) -> Self {
        Self {
            store,
            oracle,
            start_value,
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn oracle(&self) -> &dyn PriceOracle {
        self.oracle.as_ref()
    }

    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    /// Current cash, holdings and full trade history.
    pub fn get_portfolio(&self) -> Result<PortfolioSummary> {
        let ledger = self.store.snapshot()?;
        tracing::info!(cash = ledger.cash(), "Fetched portfolio");
        Ok(PortfolioSummary {
            cash: ledger.cash(),
            holdings: ledger.holdings().clone(),
            history: ledger.history().to_vec(),
        })
    }

    pub async fn get_net_worth(&self) -> Result<NetWorthSummary> {
        self.get_net_worth_at(Utc::now()).await
    }

    /// Net worth and annualized return as of `now`.
    ///
    /// A failed annualized-return computation is reported in the summary
    /// rather than failing the call.
    pub async fn get_net_worth_at(&self, now: DateTime<Utc>) -> Result<NetWorthSummary> {
        let ledger = self.store.snapshot()?;
        let holdings = holdings_value(&ledger, self.oracle.as_ref()).await;
        let net_worth = net_worth_from(ledger.cash(), &holdings);

        let (annualized_return, annualized_return_error) =
            match annualized_return_at(&ledger, net_worth, self.start_value, now) {
                Ok(ret) => (Some(ret), None),
                Err(e) => {
                    tracing::warn!(error = %e, "Annualized return unavailable");
                    (None, Some(e.to_string()))
                }
            };

        let direction = if net_worth >= self.start_value {
            Direction::Up
        } else {
            Direction::Down
        };

        let summary = NetWorthSummary {
            net_worth,
            cash: ledger.cash(),
            holdings_value: round_cents(net_worth - ledger.cash()),
            annualized_return,
            annualized_return_error,
            start_value: self.start_value,
            direction,
            change: round_cents((net_worth - self.start_value).abs()),
            quote_failures: holdings.failures,
        };

        tracing::info!(
            net_worth,
            annualized_return = ?summary.annualized_return.map(|r| r.to_string()),
            "Current net worth"
        );
        Ok(summary)
    }

    /// Buy at the current oracle price.
    pub async fn buy(&self, ticker: &str, shares: f64) -> Result<Execution> {
        let quote = self.oracle.quote(ticker).await?;
        self.store.buy(ticker, shares, quote.price)
    }

    /// Sell at the current oracle price.
    ///
    /// Holdings are checked before quoting, so a sell that cannot fill never
    /// reaches a price source.
    pub async fn sell(&self, ticker: &str, shares: f64) -> Result<Execution> {
        let held = round_shares(self.store.snapshot()?.shares_of(ticker));
        if shares.is_finite() && held < round_shares(shares) {
            let e = Error::InsufficientShares {
                ticker: normalize_ticker(ticker),
                requested: shares,
                held,
            };
            tracing::warn!(error = %e, "Trade rejected");
            return Err(e);
        }

        let quote = self.oracle.quote(ticker).await?;
        self.store.sell(ticker, shares, quote.price)
    }

    pub async fn get_stock_price(&self, ticker: &str) -> Result<Quote> {
        let quote = self.oracle.quote(ticker).await?;
        tracing::info!(ticker = %quote.ticker, price = quote.price, "Looked up stock price");
        Ok(quote)
    }

    /// Report for an external renderer.
    pub async fn report(&self, now: DateTime<Utc>, recent: usize) -> Result<PortfolioReport> {
        let ledger = self.store.snapshot()?;
        let report = PortfolioReport::build(
            &ledger,
            self.oracle.as_ref(),
            self.start_value,
            now,
            recent,
        )
        .await;
        Ok(report)
    }
}
