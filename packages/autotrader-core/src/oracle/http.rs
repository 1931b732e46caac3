//! HTTP-backed market data sources.

use super::{ensure_usable, PriceOracle, Quote, QuoteSource};
use crate::types::normalize_ticker;
use crate::{Error, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("autotrader/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

async fn get_json(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.json::<Value>().await?)
}

/// Extract `chart.result[0].meta.regularMarketPrice` from a Yahoo chart response.
pub fn parse_yahoo_price(body: &Value) -> Option<f64> {
    body.pointer("/chart/result/0/meta/regularMarketPrice")
        .and_then(Value::as_f64)
        .filter(|price| *price > 0.0)
}

/// Extract `"Global Quote"."05. price"` from an Alpha Vantage response.
///
/// The provider reports prices as strings.
pub fn parse_alpha_vantage_price(body: &Value) -> Option<f64> {
    body.pointer("/Global Quote/05. price")
        .and_then(Value::as_str)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price > 0.0)
}

/// Yahoo Finance chart endpoint (no key required).
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: YAHOO_CHART_URL.to_string(),
        })
    }

    /// Point the source at a different host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl PriceOracle for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let ticker = normalize_ticker(ticker);
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid Yahoo base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Yahoo base URL cannot take a path".to_string()))?
            .push(&ticker);

        let body = get_json(
            self.client
                .get(url)
                .query(&[("interval", "1d"), ("range", "1d")]),
        )
        .await?;

        let price = parse_yahoo_price(&body).ok_or_else(|| Error::QuoteUnavailable {
            ticker: ticker.clone(),
            reason: "no regularMarketPrice in Yahoo response".to_string(),
        })?;

        ensure_usable(Quote::new(&ticker, price, self.name(), QuoteSource::Live))
    }
}

/// Alpha Vantage GLOBAL_QUOTE endpoint.
#[derive(Debug, Clone)]
pub struct AlphaVantageSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageSource {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: ALPHA_VANTAGE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl PriceOracle for AlphaVantageSource {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let ticker = normalize_ticker(ticker);
        let body = get_json(self.client.get(&self.base_url).query(&[
            ("function", "GLOBAL_QUOTE"),
            ("symbol", ticker.as_str()),
            ("apikey", self.api_key.as_str()),
        ]))
        .await?;

        let price = parse_alpha_vantage_price(&body).ok_or_else(|| Error::QuoteUnavailable {
            ticker: ticker.clone(),
            reason: "no Global Quote price in Alpha Vantage response".to_string(),
        })?;

        ensure_usable(Quote::new(&ticker, price, self.name(), QuoteSource::Live))
    }
}
