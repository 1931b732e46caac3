//! Net worth and annualized return against a deterministic oracle.

use autotrader_core::{
    annualized_return, holdings_value, net_worth, AnnualizedReturn, Error, FixedPriceOracle,
    Ledger, Trade, TradeSide,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 16, 0, 0).unwrap()
}

fn ledger(cash: f64, holdings: &[(&str, f64)], first_trade: Option<DateTime<Utc>>) -> Ledger {
    let holdings: BTreeMap<String, f64> = holdings
        .iter()
        .map(|(ticker, shares)| (ticker.to_string(), *shares))
        .collect();
    let history = first_trade
        .map(|date| vec![Trade::new(TradeSide::Buy, "AAPL", 1.0, 100.0, date)])
        .unwrap_or_default();
    Ledger::from_parts(cash, holdings, history).unwrap()
}

#[tokio::test]
async fn empty_history_reports_zero_return() {
    let ledger = ledger(1000.0, &[], None);
    let oracle = FixedPriceOracle::new();

    let result = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();

    assert_eq!(result.to_string(), "0.00");
}

#[tokio::test]
async fn first_trade_under_a_day_ago_is_not_available() {
    let ledger = ledger(900.0, &[("AAPL", 1.0)], Some(now() - Duration::hours(12)));
    // No quote for AAPL: the short-circuit must not need one
    let oracle = FixedPriceOracle::new();

    let result = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();

    assert_eq!(result, AnnualizedReturn::NotAvailable);
    assert_eq!(result.to_string(), "N/A");
}

#[tokio::test]
async fn one_year_at_ten_percent() {
    let ledger = ledger(1100.0, &[], Some(now() - Duration::days(365)));
    let oracle = FixedPriceOracle::new();

    let result = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();

    assert_eq!(result.to_string(), "10.00");
}

#[tokio::test]
async fn holdings_count_toward_return() {
    // 600 cash + 4 MSFT @ 150 = 1200 after two years: sqrt(1.2) - 1
    let ledger = ledger(600.0, &[("MSFT", 4.0)], Some(now() - Duration::days(730)));
    let oracle = FixedPriceOracle::from_pairs([("MSFT", 150.0)]);

    let result = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();

    let expected = (1.2_f64.sqrt() - 1.0) * 100.0;
    approx::assert_abs_diff_eq!(result.percent().unwrap(), expected, epsilon = 1e-9);
    assert_eq!(result.to_string(), "9.54");
}

#[tokio::test]
async fn wiped_out_account_is_a_valuation_error() {
    let ledger = ledger(0.0, &[("AAPL", 1.0)], Some(now() - Duration::days(90)));
    let oracle = FixedPriceOracle::new();

    let result = annualized_return(&ledger, &oracle, 1000.0, now()).await;

    assert!(matches!(result, Err(Error::Valuation(_))));
}

#[tokio::test]
async fn net_worth_sums_cash_and_priced_holdings() {
    let ledger = ledger(250.5, &[("AAPL", 2.0), ("MSFT", 0.5)], None);
    let oracle = FixedPriceOracle::from_pairs([("AAPL", 100.25), ("MSFT", 300.0)]);

    let holdings = holdings_value(&ledger, &oracle).await;
    assert!(holdings.is_complete());
    assert_eq!(holdings.positions["AAPL"].value, 200.5);
    assert_eq!(holdings.positions["MSFT"].value, 150.0);
    assert_eq!(holdings.total, 350.5);

    assert_eq!(net_worth(&ledger, &oracle).await, 601.0);
}

#[tokio::test]
async fn failed_quote_is_isolated_to_its_ticker() {
    let ledger = ledger(100.0, &[("AAPL", 2.0), ("ZZZZ", 3.0)], None);
    let oracle = FixedPriceOracle::from_pairs([("AAPL", 50.0)]);

    let holdings = holdings_value(&ledger, &oracle).await;

    assert_eq!(holdings.total, 100.0);
    assert_eq!(holdings.failures.len(), 1);
    assert_eq!(holdings.failures[0].ticker, "ZZZZ");
    assert_eq!(holdings.positions["ZZZZ"].value, 0.0);
    assert_eq!(net_worth(&ledger, &oracle).await, 200.0);
}

#[tokio::test]
async fn valuation_is_idempotent_and_read_only() {
    let ledger = ledger(400.0, &[("AAPL", 3.0)], Some(now() - Duration::days(30)));
    let snapshot = ledger.clone();
    let oracle = FixedPriceOracle::from_pairs([("AAPL", 210.0)]);

    let first = net_worth(&ledger, &oracle).await;
    let second = net_worth(&ledger, &oracle).await;
    let ret_first = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();
    let ret_second = annualized_return(&ledger, &oracle, 1000.0, now()).await.unwrap();

    assert_eq!(first, 1030.0);
    assert_eq!(first, second);
    assert_eq!(ret_first, ret_second);
    assert_eq!(ledger, snapshot);
}
