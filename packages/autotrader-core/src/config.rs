//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment overrides.

use crate::ledger::LedgerStore;
use crate::valuation::DEFAULT_START_VALUE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Autotrader configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ledger JSON file
    pub ledger_path: PathBuf,
    /// Cash a new ledger starts with
    pub seed_cash: f64,
    /// Baseline for annualized return and the up/down indicator
    pub start_value: f64,
    /// Append-only log file, in addition to stderr
    pub log_file: Option<PathBuf>,
    /// Skip live price sources and use the reference table only
    pub offline: bool,
    /// Per-request timeout for live price sources
    pub quote_timeout_secs: u64,
    /// Alpha Vantage API key
    pub alpha_vantage_key: String,
    /// OpenAI key for the web_search tool
    pub openai_api_key: Option<String>,
    /// Model used by the web_search tool
    pub search_model: String,
    /// Number of recent trades in reports
    pub recent_trades: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_path: LedgerStore::default_path(),
            seed_cash: 1000.0,
            start_value: DEFAULT_START_VALUE,
            log_file: None,
            offline: false,
            quote_timeout_secs: 10,
            alpha_vantage_key: "demo".to_string(),
            openai_api_key: None,
            search_model: "gpt-4o-mini".to_string(),
            recent_trades: 10,
        }
    }
}

impl Config {
    /// Load configuration from `path` (if given) and apply environment overrides.
    ///
    /// Without an explicit path, `AUTOTRADER_CONFIG` is consulted.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("AUTOTRADER_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(path) = env::var("AUTOTRADER_LEDGER_FILE") {
            self.ledger_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("AUTOTRADER_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        if let Ok(flag) = env::var("AUTOTRADER_OFFLINE") {
            self.offline = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Ok(key) = env::var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_key = key;
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
    }

    /// Reject values the ledger and valuation layers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.seed_cash.is_finite() || self.seed_cash < 0.0 {
            return Err(Error::Config(format!(
                "seed_cash must be non-negative, got {}",
                self.seed_cash
            )));
        }
        if !self.start_value.is_finite() || self.start_value <= 0.0 {
            return Err(Error::Config(format!(
                "start_value must be positive, got {}",
                self.start_value
            )));
        }
        if self.quote_timeout_secs == 0 {
            return Err(Error::Config(
                "quote_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }

    pub fn store(&self) -> LedgerStore {
        LedgerStore::new(&self.ledger_path)
    }
}
