//! Tool trait and registry
//!
//! Tools are the operations an external decision loop may call. Each takes a
//! JSON object of parameters and returns a `ToolOutput`; business rejections
//! come back as unsuccessful outputs, only faults are errors.

mod search;
mod trading;

pub use search::{DisabledSearch, OpenAiSearch, SearchProvider, ThinkTool, WebSearchTool};
pub use trading::{BuyTool, GetNetWorthTool, GetPortfolioTool, GetStockPriceTool, SellTool};

use crate::desk::TradingDesk;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: Value,
}

impl ToolInput {
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// An expected rejection, reported to the driver as a normal result.
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            data: json!({ "message": message }),
            error: Some(message),
        }
    }

    /// Text handed back to the language model.
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

/// Name, description and JSON schema of a tool, in function-calling format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// JSON schema of the accepted parameters.
    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "additionalProperties": false })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Run one tool call the way the driver issues it.
    ///
    /// Unknown tools, bad parameters, unavailable quotes and trade rejections
    /// become unsuccessful outputs. Anything else (a corrupt or missing ledger,
    /// I/O failure) is returned as an error and should stop the run.
    pub async fn dispatch(&self, input: &ToolInput) -> Result<ToolOutput> {
        let Some(tool) = self.get(&input.tool_name) else {
            tracing::warn!(tool = %input.tool_name, "Unknown tool requested");
            return Ok(ToolOutput::rejected(
                Error::ToolNotFound(input.tool_name.clone()).to_string(),
            ));
        };

        tracing::debug!(tool = %input.tool_name, parameters = %input.parameters, "Executing tool");
        match tool.execute(input).await {
            Ok(output) => Ok(output),
            Err(e)
                if e.is_rejection()
                    || matches!(
                        e,
                        Error::InvalidToolInput(_) | Error::QuoteUnavailable { .. }
                    ) =>
            {
                tracing::warn!(tool = %input.tool_name, error = %e, "Tool call rejected");
                Ok(ToolOutput::rejected(e.to_string()))
            }
            Err(e) => {
                tracing::error!(tool = %input.tool_name, error = %e, "Tool call failed");
                Err(e)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize tool parameters into a typed struct.
pub(crate) fn parse_params<T: DeserializeOwned>(input: &ToolInput) -> Result<T> {
    let parameters = if input.parameters.is_null() {
        json!({})
    } else {
        input.parameters.clone()
    };
    if !parameters.is_object() {
        return Err(Error::InvalidToolInput(
            "tool parameters must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(parameters).map_err(|e| Error::InvalidToolInput(e.to_string()))
}

/// Create the registry of trading, research and reasoning tools.
pub fn create_default_registry(desk: TradingDesk, search: Arc<dyn SearchProvider>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(ThinkTool));
    registry.register(Arc::new(WebSearchTool::new(search)));
    registry.register(Arc::new(BuyTool::new(desk.clone())));
    registry.register(Arc::new(SellTool::new(desk.clone())));
    registry.register(Arc::new(GetStockPriceTool::new(desk.clone())));
    registry.register(Arc::new(GetPortfolioTool::new(desk.clone())));
    registry.register(Arc::new(GetNetWorthTool::new(desk)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        ticker: String,
    }

    #[test]
    fn test_parse_params() {
        let input = ToolInput::new("x", json!({ "ticker": "AAPL" }));
        let params: Params = parse_params(&input).unwrap();
        assert_eq!(params.ticker, "AAPL");

        let input = ToolInput::new("x", json!(["AAPL"]));
        assert!(matches!(
            parse_params::<Params>(&input),
            Err(Error::InvalidToolInput(_))
        ));

        let input = ToolInput::new("x", json!({ "symbol": "AAPL" }));
        assert!(matches!(
            parse_params::<Params>(&input),
            Err(Error::InvalidToolInput(_))
        ));
    }

    #[test]
    fn test_rejected_output() {
        let output = ToolOutput::rejected("nope");
        assert!(!output.success);
        assert_eq!(output.message(), Some("nope"));
        assert_eq!(output.error.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let output = registry
            .dispatch(&ToolInput::new("launch_rockets", json!({})))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.error.unwrap().contains("launch_rockets"));
    }
}
