//! Read-only valuation over a ledger snapshot.

mod returns;
mod worth;

pub use returns::{
    annualized_return, annualized_return_at, cagr, elapsed_days, AnnualizedReturn,
    DEFAULT_START_VALUE,
};
pub use worth::{
    holdings_value, net_worth, net_worth_from, HoldingValue, HoldingsValuation, QuoteFailure,
};
