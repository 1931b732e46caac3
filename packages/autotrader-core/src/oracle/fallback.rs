//! Reference prices and the source fallback chain.

use super::{ensure_usable, AlphaVantageSource, PriceOracle, Quote, QuoteSource, YahooChartSource};
use crate::config::Config;
use crate::types::{normalize_ticker, round_cents};
use crate::Result;
use rand::Rng;
use std::sync::Arc;

/// Recent closing prices for commonly traded tickers.
const REFERENCE_PRICES: &[(&str, f64)] = &[
    ("AAPL", 224.50),
    ("GOOGL", 175.20),
    ("MSFT", 419.70),
    ("TSLA", 246.80),
    ("NVDA", 126.50),
    ("XLI", 135.40),
    ("HEI", 225.30),
    ("RCL", 160.25),
    ("NIO", 4.25),
    ("XLP", 80.15),
    ("XLV", 135.60),
    ("XLY", 190.25),
    ("XLF", 42.80),
    ("SPY", 550.20),
];

/// Last-resort oracle: a reference table, then a random estimate in [50, 250).
///
/// Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPriceTable;

impl StaticPriceTable {
    /// Reference price for `ticker`, if the table has one.
    pub fn reference_price(ticker: &str) -> Option<f64> {
        let ticker = normalize_ticker(ticker);
        REFERENCE_PRICES
            .iter()
            .find(|(symbol, _)| *symbol == ticker)
            .map(|(_, price)| *price)
    }
}

#[async_trait::async_trait]
impl PriceOracle for StaticPriceTable {
    fn name(&self) -> &'static str {
        "reference"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let quote = match Self::reference_price(ticker) {
            Some(price) => Quote::new(ticker, price, self.name(), QuoteSource::Reference),
            None => {
                let estimate = round_cents(rand::thread_rng().gen_range(50.0..250.0));
                Quote::new(ticker, estimate, self.name(), QuoteSource::Estimate)
            }
        };
        tracing::warn!(
            ticker = %quote.ticker,
            price = quote.price,
            source = ?quote.source,
            "Using fallback price"
        );
        Ok(quote)
    }
}

/// Tries each source in order and settles on the static table.
pub struct FallbackOracle {
    sources: Vec<Arc<dyn PriceOracle>>,
    last_resort: StaticPriceTable,
}

impl FallbackOracle {
    pub fn new(sources: Vec<Arc<dyn PriceOracle>>) -> Self {
        Self {
            sources,
            last_resort: StaticPriceTable,
        }
    }

    /// Yahoo, then Alpha Vantage, then the static table. Offline mode keeps only the table.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.offline {
            return Ok(Self::new(Vec::new()));
        }

        let timeout = config.quote_timeout();
        let sources: Vec<Arc<dyn PriceOracle>> = vec![
            Arc::new(YahooChartSource::new(timeout)?),
            Arc::new(AlphaVantageSource::new(
                config.alpha_vantage_key.clone(),
                timeout,
            )?),
        ];
        Ok(Self::new(sources))
    }

    /// Names of the live sources, in the order they are tried.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait::async_trait]
impl PriceOracle for FallbackOracle {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote> {
        for source in &self.sources {
            match source.quote(ticker).await.and_then(ensure_usable) {
                Ok(quote) => {
                    tracing::info!(
                        ticker = %quote.ticker,
                        price = quote.price,
                        provider = source.name(),
                        "Found price"
                    );
                    return Ok(quote);
                }
                Err(e) => {
                    tracing::warn!(
                        ticker,
                        provider = source.name(),
                        error = %e,
                        "Price source failed"
                    );
                }
            }
        }

        self.last_resort.quote(ticker).await
    }
}
