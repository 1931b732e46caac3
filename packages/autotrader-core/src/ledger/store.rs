//! JSON file persistence for the ledger.

use super::state::{Execution, Ledger};
use crate::{Error, Result};
use chrono::Utc;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable home of a single ledger.
///
/// Every mutating call is a complete load, apply, persist cycle. A rejected
/// trade never reaches the persist step, so the file is written exactly once
/// per committed trade and not at all otherwise.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default ledger file path.
    ///
    /// Default path: `~/.autotrader/portfolio.json`
    /// Can be overridden with `AUTOTRADER_LEDGER_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("AUTOTRADER_LEDGER_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".autotrader/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    /// Get the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a ledger has been persisted yet.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted ledger.
    pub fn load(&self) -> Result<Ledger> {
        if !self.path.exists() {
            return Err(Error::NotInitialized(self.path.display().to_string()));
        }

        let content = fs::read_to_string(&self.path)?;
        Ledger::from_json(&content)
    }

    /// Write a fresh ledger holding `cash`.
    ///
    /// Refuses to replace an existing ledger unless `overwrite` is set.
    pub fn seed(&self, cash: f64, overwrite: bool) -> Result<Ledger> {
        if self.exists() && !overwrite {
            return Err(Error::AlreadyInitialized(self.path.display().to_string()));
        }

        let ledger = Ledger::seeded(cash)?;
        self.save(&ledger)?;
        tracing::info!(path = %self.path.display(), cash, "Seeded new ledger");
        Ok(ledger)
    }

    /// Load the ledger, seeding it with `cash` on first use.
    pub fn load_or_seed(&self, cash: f64) -> Result<Ledger> {
        if self.exists() {
            self.load()
        } else {
            self.seed(cash, false)
        }
    }

    /// Persist the full ledger, replacing the file atomically.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let content = ledger.to_json()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Read-only view of the current ledger.
    pub fn snapshot(&self) -> Result<Ledger> {
        self.load()
    }

    /// Buy `shares` of `ticker` at `price` and persist.
    pub fn buy(&self, ticker: &str, shares: f64, price: f64) -> Result<Execution> {
        let execution = self.apply(|ledger| ledger.buy(ticker, shares, price, Utc::now()))?;
        tracing::info!(
            ticker = %execution.trade.ticker,
            shares,
            price,
            cash = execution.cash,
            "Purchased shares"
        );
        Ok(execution)
    }

    /// Sell `shares` of `ticker` at `price` and persist.
    pub fn sell(&self, ticker: &str, shares: f64, price: f64) -> Result<Execution> {
        let execution = self.apply(|ledger| ledger.sell(ticker, shares, price, Utc::now()))?;
        tracing::info!(
            ticker = %execution.trade.ticker,
            shares,
            price,
            cash = execution.cash,
            "Sold shares"
        );
        Ok(execution)
    }

    fn apply<F>(&self, op: F) -> Result<Execution>
    where
        F: FnOnce(&mut Ledger) -> Result<Execution>,
    {
        let mut ledger = self.load()?;
        let execution = op(&mut ledger).inspect_err(|e| {
            if e.is_rejection() {
                tracing::warn!(error = %e, "Trade rejected");
            }
        })?;
        self.save(&ledger)?;
        Ok(execution)
    }
}
