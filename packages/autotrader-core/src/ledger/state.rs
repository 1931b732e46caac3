//! Ledger state machine.

use crate::types::{normalize_ticker, round_cents, round_shares, Trade, TradeSide};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cash, holdings and trade history of the simulated account.
///
/// Fields are private so every change goes through `buy`/`sell`, which validate
/// before touching anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ledger {
    cash: f64,
    holdings: BTreeMap<String, f64>,
    history: Vec<Trade>,
}

/// Outcome of a committed trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    /// Cash balance after the trade
    pub cash: f64,
    /// Shares of the ticker held after the trade
    pub position: f64,
    /// The recorded trade
    pub trade: Trade,
}

impl Ledger {
    /// Create a fresh ledger holding only cash.
    pub fn seeded(cash: f64) -> Result<Self> {
        Self::from_parts(cash, BTreeMap::new(), Vec::new())
    }

    /// Assemble a ledger from existing parts, enforcing every invariant.
    pub fn from_parts(
        cash: f64,
        holdings: BTreeMap<String, f64>,
        history: Vec<Trade>,
    ) -> Result<Self> {
        Self {
            cash,
            holdings,
            history,
        }
        .validated()
    }

    /// Parse a persisted ledger. Any schema or invariant mismatch is `CorruptState`.
    pub fn from_json(content: &str) -> Result<Self> {
        let ledger: Ledger =
            serde_json::from_str(content).map_err(|e| Error::CorruptState(e.to_string()))?;
        ledger.validated()
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validated(self) -> Result<Self> {
        if !self.cash.is_finite() || self.cash < 0.0 {
            return Err(Error::CorruptState(format!(
                "cash must be a non-negative number, found {}",
                self.cash
            )));
        }

        let mut holdings = BTreeMap::new();
        for (ticker, shares) in self.holdings {
            let key = normalize_ticker(&ticker);
            if key.is_empty() {
                return Err(Error::CorruptState("empty ticker in holdings".to_string()));
            }
            if !shares.is_finite() || shares < 0.0 {
                return Err(Error::CorruptState(format!(
                    "holding {} must be non-negative, found {}",
                    ticker, shares
                )));
            }
            if holdings.insert(key.clone(), shares).is_some() {
                return Err(Error::CorruptState(format!(
                    "ticker {} appears more than once in holdings",
                    key
                )));
            }
        }

        for (idx, trade) in self.history.iter().enumerate() {
            let valid = trade.shares.is_finite()
                && trade.shares > 0.0
                && trade.price.is_finite()
                && trade.price > 0.0
                && trade.total.is_finite()
                && !trade.ticker.trim().is_empty();
            if !valid {
                return Err(Error::CorruptState(format!(
                    "history entry {} is not a valid trade",
                    idx
                )));
            }
        }

        Ok(Self {
            cash: self.cash,
            holdings,
            history: self.history,
        })
    }

    /// Current cash balance.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// All holdings, including tickers that were sold down to zero.
    pub fn holdings(&self) -> &BTreeMap<String, f64> {
        &self.holdings
    }

    /// Shares held of `ticker` (0 when never traded).
    pub fn shares_of(&self, ticker: &str) -> f64 {
        self.holdings
            .get(&normalize_ticker(ticker))
            .copied()
            .unwrap_or(0.0)
    }

    /// Trade history, oldest first.
    pub fn history(&self) -> &[Trade] {
        &self.history
    }

    /// Timestamp of the oldest trade.
    pub fn first_trade_date(&self) -> Option<DateTime<Utc>> {
        self.history.first().map(|t| t.date)
    }

    /// Execute a buy at `price` per share.
    ///
    /// Rejected orders leave the ledger untouched.
    pub fn buy(
        &mut self,
        ticker: &str,
        shares: f64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<Execution> {
        let ticker = validate_order(ticker, shares, price)?;

        let cost = shares * price;
        if self.cash < cost {
            return Err(Error::InsufficientFunds {
                needed: cost,
                available: self.cash,
                price,
            });
        }

        let position = self.holdings.entry(ticker.clone()).or_insert(0.0);
        *position = round_shares(*position + shares);
        let position = *position;

        self.cash = round_cents(self.cash - cost);

        let trade = Trade::new(TradeSide::Buy, &ticker, shares, price, at);
        self.history.push(trade.clone());

        Ok(Execution {
            cash: self.cash,
            position,
            trade,
        })
    }

    /// Execute a sell at `price` per share.
    ///
    /// A ticker that was never bought counts as zero shares held.
    pub fn sell(
        &mut self,
        ticker: &str,
        shares: f64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<Execution> {
        let ticker = validate_order(ticker, shares, price)?;

        let held = round_shares(self.shares_of(&ticker));
        if held < round_shares(shares) {
            return Err(Error::InsufficientShares {
                ticker,
                requested: shares,
                held,
            });
        }

        let position = round_shares(held - shares);
        self.holdings.insert(ticker.clone(), position);
        self.cash = round_cents(self.cash + shares * price);

        let trade = Trade::new(TradeSide::Sell, &ticker, shares, price, at);
        self.history.push(trade.clone());

        Ok(Execution {
            cash: self.cash,
            position,
            trade,
        })
    }

    /// Tickers with a strictly positive share count.
    pub fn open_positions(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings
            .iter()
            .filter(|(_, shares)| **shares > 0.0)
            .map(|(ticker, shares)| (ticker.as_str(), *shares))
    }
}

fn validate_order(ticker: &str, shares: f64, price: f64) -> Result<String> {
    let ticker = normalize_ticker(ticker);
    if ticker.is_empty() {
        return Err(Error::InvalidOrder("ticker must not be empty".to_string()));
    }
    if !shares.is_finite() || shares <= 0.0 {
        return Err(Error::InvalidOrder(format!(
            "shares must be positive, got {}",
            shares
        )));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidOrder(format!(
            "price must be positive, got {}",
            price
        )));
    }
    Ok(ticker)
}
