//! Core data types shared across the ledger, valuation and tool layers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Round a monetary amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Round a share count to 8 decimal places, dropping float dust from repeated sums.
pub fn round_shares(shares: f64) -> f64 {
    (shares * 1e8).round() / 1e8
}

/// Canonical form of a ticker symbol: trimmed, upper case.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Trade direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A single executed trade, as recorded in the ledger history.
///
/// `total` is captured at execution time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Trade {
    /// When the trade executed (UTC)
    #[serde(serialize_with = "serialize_iso8601")]
    pub date: DateTime<Utc>,
    /// Buy or Sell
    #[serde(rename = "type")]
    pub side: TradeSide,
    /// Ticker symbol
    pub ticker: String,
    /// Number of shares
    pub shares: f64,
    /// Price per share at execution
    pub price: f64,
    /// shares * price at execution, unrounded
    pub total: f64,
}

impl Trade {
    /// Create a trade executed at `date`.
    pub fn new(
        side: TradeSide,
        ticker: &str,
        shares: f64,
        price: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            date,
            side,
            ticker: normalize_ticker(ticker),
            shares,
            price,
            total: shares * price,
        }
    }

    /// One-line description used in tool output and logs.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} {} shares at ${} per share, for a total of ${}",
            self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.side,
            self.ticker,
            self.shares,
            self.price,
            self.total
        )
    }
}

/// Millisecond-precision `...Z` timestamps, the shape the ledger file has always used.
fn serialize_iso8601<S: Serializer>(
    date: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// API response wrapper for CLI and tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(800.004), 800.0);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(1234.5678), 1234.57);
    }

    #[test]
    fn test_round_shares() {
        assert_eq!(round_shares(0.7 + 0.1), 0.8);
        assert_eq!(round_shares(0.1 + 0.2 - 0.3), 0.0);
        assert_eq!(round_shares(1.123456789), 1.12345679);
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" aapl "), "AAPL");
        assert_eq!(normalize_ticker("Brk.b"), "BRK.B");
    }

    #[test]
    fn test_trade_new() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let trade = Trade::new(TradeSide::Buy, "aapl", 2.0, 100.0, date);
        assert_eq!(trade.ticker, "AAPL");
        assert_eq!(trade.total, 200.0);
    }

    #[test]
    fn test_trade_wire_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let trade = Trade::new(TradeSide::Sell, "MSFT", 1.5, 10.0, date);
        let json = serde_json::to_value(&trade).unwrap();

        assert_eq!(json["type"], "sell");
        assert_eq!(json["date"], "2024-03-01T14:30:00.000Z");
        assert_eq!(json["total"], 15.0);
    }

    #[test]
    fn test_trade_rejects_unknown_side() {
        let raw = r#"{"date":"2024-03-01T14:30:00.000Z","type":"short","ticker":"A","shares":1,"price":1,"total":1}"#;
        assert!(serde_json::from_str::<Trade>(raw).is_err());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
