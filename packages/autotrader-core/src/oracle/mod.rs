//! Price oracles: ticker in, current price out.
//!
//! The ledger and valuation layers only see the `PriceOracle` trait. Live
//! sources may fail; `FallbackOracle` chains them and finishes on a reference
//! table so callers always get some price.

mod fallback;
mod http;

pub use fallback::{FallbackOracle, StaticPriceTable};
pub(crate) use http::build_client;
pub use http::{parse_alpha_vantage_price, parse_yahoo_price, AlphaVantageSource, YahooChartSource};

use crate::types::normalize_ticker;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a quoted price came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// A market data provider
    Live,
    /// A fixed reference table
    Reference,
    /// A synthetic estimate for an unknown ticker
    Estimate,
}

/// A resolved price for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    /// Ticker symbol (upper case)
    pub ticker: String,
    /// Price per share in USD
    pub price: f64,
    /// Provider name
    pub provider: String,
    /// Kind of source
    pub source: QuoteSource,
}

impl Quote {
    pub fn new(ticker: &str, price: f64, provider: &str, source: QuoteSource) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            price,
            provider: provider.to_string(),
            source,
        }
    }

    /// Whether the price is a degraded substitute rather than market data.
    pub fn is_degraded(&self) -> bool {
        self.source != QuoteSource::Live
    }
}

/// Capability to resolve a ticker to its current price.
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    fn name(&self) -> &'static str;
    async fn quote(&self, ticker: &str) -> Result<Quote>;
}

/// Deterministic oracle over a fixed price map.
///
/// Unknown tickers fail with `QuoteUnavailable`.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceOracle {
    prices: HashMap<String, f64>,
}

impl FixedPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            prices: pairs
                .into_iter()
                .map(|(ticker, price)| (normalize_ticker(ticker), price))
                .collect(),
        }
    }

    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.prices.insert(normalize_ticker(ticker), price);
        self
    }
}

#[async_trait::async_trait]
impl PriceOracle for FixedPriceOracle {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let ticker = normalize_ticker(ticker);
        self.prices
            .get(&ticker)
            .map(|price| Quote::new(&ticker, *price, self.name(), QuoteSource::Reference))
            .ok_or_else(|| Error::QuoteUnavailable {
                ticker,
                reason: "no fixed price".to_string(),
            })
    }
}

/// A quote is usable only when its price is a positive, finite number.
pub(crate) fn ensure_usable(quote: Quote) -> Result<Quote> {
    if quote.price.is_finite() && quote.price > 0.0 {
        Ok(quote)
    } else {
        Err(Error::QuoteUnavailable {
            reason: format!("unusable price {}", quote.price),
            ticker: quote.ticker,
        })
    }
}
