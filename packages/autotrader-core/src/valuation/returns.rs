//! Annualized return (CAGR) since the first trade.

use super::worth::net_worth;
use crate::ledger::Ledger;
use crate::oracle::PriceOracle;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Baseline account value the agent started with.
pub const DEFAULT_START_VALUE: f64 = 1000.0;

const DAYS_PER_YEAR: f64 = 365.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Annualized return as reported to the driver.
///
/// Renders as a percentage with two decimals (`"10.00"`) or `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnualizedReturn {
    /// CAGR in percent
    Percent(f64),
    /// Less than a day since the first trade
    NotAvailable,
}

impl AnnualizedReturn {
    pub fn percent(&self) -> Option<f64> {
        match self {
            AnnualizedReturn::Percent(p) => Some(*p),
            AnnualizedReturn::NotAvailable => None,
        }
    }
}

impl fmt::Display for AnnualizedReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnualizedReturn::Percent(p) => write!(f, "{:.2}", p),
            AnnualizedReturn::NotAvailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for AnnualizedReturn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fractional days from `since` to `now`. Negative if `now` is earlier.
pub fn elapsed_days(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Compound annual growth rate as a fraction (0.10 for 10%).
pub fn cagr(start_value: f64, current_value: f64, days: f64) -> Result<f64> {
    if !start_value.is_finite() || start_value <= 0.0 {
        return Err(Error::Valuation(format!(
            "start value must be positive, got {}",
            start_value
        )));
    }
    if !current_value.is_finite() || current_value <= 0.0 {
        return Err(Error::Valuation(format!(
            "current value must be positive to annualize, got {}",
            current_value
        )));
    }
    if !days.is_finite() || days <= 0.0 {
        return Err(Error::Valuation(format!(
            "elapsed time must be positive, got {} days",
            days
        )));
    }

    let years = days / DAYS_PER_YEAR;
    let rate = (current_value / start_value).powf(1.0 / years) - 1.0;
    if !rate.is_finite() {
        return Err(Error::Valuation(format!(
            "growth over {:.2} days does not produce a finite rate",
            days
        )));
    }
    Ok(rate)
}

/// Annualized return given an already computed current value.
///
/// - no trades yet: `0.00`
/// - under one day since the first trade: `N/A`
/// - otherwise CAGR from `start_value` to `current_value`
pub fn annualized_return_at(
    ledger: &Ledger,
    current_value: f64,
    start_value: f64,
    now: DateTime<Utc>,
) -> Result<AnnualizedReturn> {
    let Some(first_trade) = ledger.first_trade_date() else {
        return Ok(AnnualizedReturn::Percent(0.0));
    };

    let days = elapsed_days(first_trade, now);
    tracing::debug!("Days since first trade: {:.2}", days);
    if days < 1.0 {
        tracing::info!("Not enough time has passed to compute CAGR");
        return Ok(AnnualizedReturn::NotAvailable);
    }

    let rate = cagr(start_value, current_value, days)?;
    tracing::info!(current_value, cagr_percent = rate * 100.0, "Computed CAGR");
    Ok(AnnualizedReturn::Percent(rate * 100.0))
}

/// Annualized return of the ledger valued at current oracle prices.
///
/// Prices are only fetched when the history spans at least a day.
pub async fn annualized_return(
    ledger: &Ledger,
    oracle: &dyn PriceOracle,
    start_value: f64,
    now: DateTime<Utc>,
) -> Result<AnnualizedReturn> {
    match ledger.first_trade_date() {
        Some(first) if elapsed_days(first, now) >= 1.0 => {
            let current_value = net_worth(ledger, oracle).await;
            annualized_return_at(ledger, current_value, start_value, now)
        }
        _ => annualized_return_at(ledger, 0.0, start_value, now),
    }
}
