//! Portfolio report for external renderers.

use crate::ledger::Ledger;
use crate::oracle::PriceOracle;
use crate::types::Trade;
use crate::valuation::{
    annualized_return_at, holdings_value, net_worth_from, AnnualizedReturn, HoldingValue,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of account value, positions and recent activity.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub generated_at: DateTime<Utc>,
    pub total_value: f64,
    pub cash: f64,
    pub holdings: BTreeMap<String, HoldingValue>,
    /// Percentage string or "N/A"; `None` when it could not be computed
    pub annualized_return: Option<AnnualizedReturn>,
    /// Newest first
    pub recent_trades: Vec<Trade>,
}

impl PortfolioReport {
    /// Value the ledger and collect the `recent` most recent trades.
    pub async fn build(
        ledger: &Ledger,
        oracle: &dyn PriceOracle,
        start_value: f64,
        now: DateTime<Utc>,
        recent: usize,
    ) -> Self {
        let holdings = holdings_value(ledger, oracle).await;
        let total_value = net_worth_from(ledger.cash(), &holdings);

        let annualized_return = annualized_return_at(ledger, total_value, start_value, now)
            .inspect_err(|e| tracing::warn!(error = %e, "Report without annualized return"))
            .ok();

        let recent_trades = ledger.history().iter().rev().take(recent).cloned().collect();

        Self {
            generated_at: now,
            total_value,
            cash: ledger.cash(),
            holdings: holdings.positions,
            annualized_return,
            recent_trades,
        }
    }
}
