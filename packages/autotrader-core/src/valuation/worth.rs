//! Holdings value and net worth.

use crate::ledger::Ledger;
use crate::oracle::PriceOracle;
use crate::types::round_cents;
use serde::Serialize;
use std::collections::BTreeMap;

/// Market value of one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingValue {
    pub shares: f64,
    /// Quoted price, `None` when the quote failed
    pub price: Option<f64>,
    /// shares * price rounded to cents, 0 when the quote failed
    pub value: f64,
}

/// A ticker that could not be priced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteFailure {
    pub ticker: String,
    pub reason: String,
}

/// Value of every open position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingsValuation {
    /// Sum of per-ticker values, rounded to cents
    pub total: f64,
    pub positions: BTreeMap<String, HoldingValue>,
    /// Tickers valued at 0 because no usable quote was available
    pub failures: Vec<QuoteFailure>,
}

impl HoldingsValuation {
    /// Whether every open position was priced.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Price every ticker with a positive share count.
///
/// A failed or unusable quote values that ticker at 0 and is recorded in
/// `failures`; the other tickers are still priced.
pub async fn holdings_value(ledger: &Ledger, oracle: &dyn PriceOracle) -> HoldingsValuation {
    let mut positions = BTreeMap::new();
    let mut failures = Vec::new();
    let mut total = 0.0;

    for (ticker, shares) in ledger.open_positions() {
        let priced = match oracle.quote(ticker).await {
            Ok(quote) if quote.price.is_finite() && quote.price > 0.0 => Ok(quote.price),
            Ok(quote) => Err(format!("unusable price {}", quote.price)),
            Err(e) => Err(e.to_string()),
        };

        let holding = match priced {
            Ok(price) => HoldingValue {
                shares,
                price: Some(price),
                value: round_cents(shares * price),
            },
            Err(reason) => {
                tracing::warn!(ticker, error = %reason, "Failed to get price, valuing at 0");
                failures.push(QuoteFailure {
                    ticker: ticker.to_string(),
                    reason,
                });
                HoldingValue {
                    shares,
                    price: None,
                    value: 0.0,
                }
            }
        };

        total += holding.value;
        positions.insert(ticker.to_string(), holding);
    }

    HoldingsValuation {
        total: round_cents(total),
        positions,
        failures,
    }
}

/// Cash plus an already computed holdings valuation, rounded to cents.
pub fn net_worth_from(cash: f64, holdings: &HoldingsValuation) -> f64 {
    round_cents(cash + holdings.total)
}

/// Cash plus the current market value of all holdings, rounded to cents.
pub async fn net_worth(ledger: &Ledger, oracle: &dyn PriceOracle) -> f64 {
    let holdings = holdings_value(ledger, oracle).await;
    net_worth_from(ledger.cash(), &holdings)
}
