//! Ledger-backed tools: buy, sell, quotes, portfolio and net worth.

use super::{parse_params, Tool, ToolInput, ToolOutput};
use crate::desk::TradingDesk;
use crate::types::normalize_ticker;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrderParams {
    ticker: String,
    shares: f64,
}

impl OrderParams {
    fn parse(input: &ToolInput) -> Result<Self> {
        let params: OrderParams = parse_params(input)?;
        if params.ticker.trim().is_empty() {
            return Err(Error::InvalidToolInput("ticker must not be empty".to_string()));
        }
        if !params.shares.is_finite() || params.shares <= 0.0 {
            return Err(Error::InvalidToolInput(format!(
                "shares must be a positive number, got {}",
                params.shares
            )));
        }
        Ok(params)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TickerParams {
    ticker: String,
}

fn order_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ticker": { "type": "string", "description": "Stock ticker symbol" },
            "shares": { "type": "number", "exclusiveMinimum": 0, "description": "Number of shares, may be fractional" }
        },
        "required": ["ticker", "shares"],
        "additionalProperties": false
    })
}

pub struct BuyTool {
    desk: TradingDesk,
}

impl BuyTool {
    pub fn new(desk: TradingDesk) -> Self {
        Self { desk }
    }
}

#[async_trait::async_trait]
impl Tool for BuyTool {
    fn name(&self) -> &'static str {
        "buy"
    }

    fn description(&self) -> &'static str {
        "Buy a given stock at the current market price"
    }

    fn parameters(&self) -> Value {
        order_schema()
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params = OrderParams::parse(input)?;

        match self.desk.buy(&params.ticker, params.shares).await {
            Ok(execution) => {
                let trade = &execution.trade;
                let message = format!(
                    "Purchased {} shares of {} at ${} per share, for a total of ${}. Your cash balance is now ${}.",
                    trade.shares, trade.ticker, trade.price, trade.total, execution.cash
                );
                Ok(ToolOutput::success(json!({
                    "message": message,
                    "execution": execution,
                })))
            }
            Err(Error::InsufficientFunds {
                available, price, ..
            }) => Ok(ToolOutput::rejected(format!(
                "You don't have enough cash to buy {} shares of {}. \
                 Your cash balance is ${} and the price is ${} per share.",
                params.shares,
                normalize_ticker(&params.ticker),
                available,
                price
            ))),
            Err(e) => Err(e),
        }
    }
}

pub struct SellTool {
    desk: TradingDesk,
}

impl SellTool {
    pub fn new(desk: TradingDesk) -> Self {
        Self { desk }
    }
}

#[async_trait::async_trait]
impl Tool for SellTool {
    fn name(&self) -> &'static str {
        "sell"
    }

    fn description(&self) -> &'static str {
        "Sell a given stock at the current market price"
    }

    fn parameters(&self) -> Value {
        order_schema()
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params = OrderParams::parse(input)?;

        match self.desk.sell(&params.ticker, params.shares).await {
            Ok(execution) => {
                let trade = &execution.trade;
                let message = format!(
                    "Sold {} shares of {} at ${} per share, for a total of ${}. Your cash balance is now ${}.",
                    trade.shares, trade.ticker, trade.price, trade.total, execution.cash
                );
                Ok(ToolOutput::success(json!({
                    "message": message,
                    "execution": execution,
                })))
            }
            Err(Error::InsufficientShares { ticker, held, .. }) => {
                Ok(ToolOutput::rejected(format!(
                    "You don't have enough shares of {} to sell. You have {} shares.",
                    ticker, held
                )))
            }
            Err(e) => Err(e),
        }
    }
}

pub struct GetStockPriceTool {
    desk: TradingDesk,
}

impl GetStockPriceTool {
    pub fn new(desk: TradingDesk) -> Self {
        Self { desk }
    }
}

#[async_trait::async_trait]
impl Tool for GetStockPriceTool {
    fn name(&self) -> &'static str {
        "get_stock_price"
    }

    fn description(&self) -> &'static str {
        "Get the current price of a given stock ticker"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": { "type": "string", "description": "Stock ticker symbol" }
            },
            "required": ["ticker"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params: TickerParams = parse_params(input)?;
        let quote = self.desk.get_stock_price(&params.ticker).await?;

        Ok(ToolOutput::success(json!({
            "message": quote.price.to_string(),
            "quote": quote,
        })))
    }
}

pub struct GetPortfolioTool {
    desk: TradingDesk,
}

impl GetPortfolioTool {
    pub fn new(desk: TradingDesk) -> Self {
        Self { desk }
    }
}

#[async_trait::async_trait]
impl Tool for GetPortfolioTool {
    fn name(&self) -> &'static str {
        "get_portfolio"
    }

    fn description(&self) -> &'static str {
        "Get your portfolio"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let _: Empty = parse_params(input)?;
        let portfolio = self.desk.get_portfolio()?;

        Ok(ToolOutput::success(json!({
            "message": portfolio.render(),
            "portfolio": portfolio,
        })))
    }
}

pub struct GetNetWorthTool {
    desk: TradingDesk,
}

impl GetNetWorthTool {
    pub fn new(desk: TradingDesk) -> Self {
        Self { desk }
    }
}

#[async_trait::async_trait]
impl Tool for GetNetWorthTool {
    fn name(&self) -> &'static str {
        "get_net_worth"
    }

    fn description(&self) -> &'static str {
        "Get your current net worth (total portfolio value)"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let _: Empty = parse_params(input)?;
        let summary = self.desk.get_net_worth().await?;

        Ok(ToolOutput::success(json!({
            "message": summary.render(),
            "net_worth": summary,
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Empty {}
