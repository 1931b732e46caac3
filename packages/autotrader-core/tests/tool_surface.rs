//! Tool calls as a driver issues them.

use autotrader_core::tools::DisabledSearch;
use autotrader_core::{
    create_default_registry, Error, FixedPriceOracle, LedgerStore, ToolInput, ToolRegistry,
    TradingDesk,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn registry(path: &Path, cash: f64) -> ToolRegistry {
    let store = LedgerStore::new(path);
    store.seed(cash, false).unwrap();
    let oracle = FixedPriceOracle::from_pairs([("AAPL", 100.0), ("NVDA", 125.0)]);
    let desk = TradingDesk::new(store, Arc::new(oracle), 1000.0);
    create_default_registry(desk, Arc::new(DisabledSearch))
}

#[test]
fn registry_exposes_every_tool() {
    let dir = tempdir().unwrap();
    let registry = registry(&dir.path().join("portfolio.json"), 1000.0);

    assert_eq!(
        registry.list(),
        vec![
            "buy",
            "get_net_worth",
            "get_portfolio",
            "get_stock_price",
            "sell",
            "think",
            "web_search"
        ]
    );

    let buy = registry
        .definitions()
        .into_iter()
        .find(|d| d.name == "buy")
        .unwrap();
    assert_eq!(buy.parameters["required"], json!(["ticker", "shares"]));
}

#[test]
fn listing_tools_does_not_create_a_ledger() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portfolio.json");
    let desk = TradingDesk::new(
        LedgerStore::new(&path),
        Arc::new(FixedPriceOracle::new()),
        1000.0,
    );

    let registry = create_default_registry(desk, Arc::new(DisabledSearch));
    assert_eq!(registry.definitions().len(), 7);
    assert!(!path.exists());
}

#[tokio::test]
async fn trading_session_through_tools() {
    let dir = tempdir().unwrap();
    let registry = registry(&dir.path().join("portfolio.json"), 1000.0);

    let bought = registry
        .dispatch(&ToolInput::new("buy", json!({ "ticker": "NVDA", "shares": 4 })))
        .await
        .unwrap();
    assert!(bought.success);
    assert_eq!(bought.data["execution"]["cash"], 500.0);

    let sold = registry
        .dispatch(&ToolInput::new("sell", json!({ "ticker": "nvda", "shares": 1.5 })))
        .await
        .unwrap();
    assert!(sold.success);
    assert_eq!(sold.data["execution"]["position"], 2.5);

    let portfolio = registry
        .dispatch(&ToolInput::new("get_portfolio", json!({})))
        .await
        .unwrap();
    assert_eq!(portfolio.data["portfolio"]["cash"], 687.5);
    assert_eq!(portfolio.data["portfolio"]["holdings"]["NVDA"], 2.5);
    assert_eq!(
        portfolio.data["portfolio"]["history"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );

    let worth = registry
        .dispatch(&ToolInput::new("get_net_worth", Value::Null))
        .await
        .unwrap();
    assert_eq!(worth.data["net_worth"]["net_worth"], 1000.0);
    assert_eq!(worth.data["net_worth"]["annualized_return"], "N/A");
    assert_eq!(worth.data["net_worth"]["direction"], "up");
}

#[tokio::test]
async fn rejections_are_unsuccessful_outputs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portfolio.json");
    let registry = registry(&path, 50.0);
    let before = fs::read(&path).unwrap();

    let calls = [
        ToolInput::new("buy", json!({ "ticker": "AAPL", "shares": 1 })),
        ToolInput::new("sell", json!({ "ticker": "AAPL", "shares": 1 })),
        ToolInput::new("buy", json!({ "ticker": "AAPL", "shares": -3 })),
        ToolInput::new("buy", json!({ "ticker": "UNLISTED", "shares": 1 })),
        ToolInput::new("get_stock_price", json!({ "symbol": "AAPL" })),
        ToolInput::new("short_sell", json!({ "ticker": "AAPL" })),
    ];
    for input in &calls {
        let output = registry.dispatch(input).await.unwrap();
        assert!(!output.success, "{} succeeded", input.tool_name);
        assert!(output.error.is_some());
        assert!(output.message().is_some());
    }

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn corrupt_ledger_stops_the_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portfolio.json");
    let registry = registry(&path, 1000.0);
    fs::write(&path, r#"{"cash": "lots", "holdings": {}, "history": []}"#).unwrap();

    let result = registry
        .dispatch(&ToolInput::new("get_portfolio", Value::Null))
        .await;

    assert!(matches!(result, Err(Error::CorruptState(_))));
}

#[tokio::test]
async fn research_tools_never_fail() {
    let dir = tempdir().unwrap();
    let registry = registry(&dir.path().join("portfolio.json"), 1000.0);

    let search = registry
        .dispatch(&ToolInput::new("web_search", json!({ "query": "NVDA guidance" })))
        .await
        .unwrap();
    assert!(search.success);
    assert!(search.message().unwrap().starts_with("Sorry"));

    let think = registry
        .dispatch(&ToolInput::new(
            "think",
            json!({ "thought_process": ["NVDA is volatile", "keep position small", "buy 1 share"] }),
        ))
        .await
        .unwrap();
    assert_eq!(
        think.message(),
        Some("Completed thinking with 3 steps of reasoning.")
    );
}
