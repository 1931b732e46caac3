//! Research and reasoning tools that never touch the ledger.

use super::{parse_params, Tool, ToolInput, ToolOutput};
use crate::config::Config;
use crate::oracle::build_client;
use crate::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Answers a free-text research query.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Provider used when no search backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

#[async_trait::async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(&self, _query: &str) -> Result<String> {
        Err(Error::Config("web search is not configured".to_string()))
    }
}

/// Search through an OpenAI chat-completions model.
#[derive(Debug, Clone)]
pub struct OpenAiSearch {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiSearch {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(config.quote_timeout())?,
            api_key: api_key.into(),
            model: model.into(),
            url: OPENAI_CHAT_URL.to_string(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match config.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                Ok(Some(Self::new(key, config.search_model.clone(), config)?))
            }
            _ => Ok(None),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait::async_trait]
impl SearchProvider for OpenAiSearch {
    async fn search(&self, query: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a financial research assistant. Answer concisely with the most recent information you have about companies, markets and stocks."
                },
                { "role": "user", "content": query }
            ]
        });

        let response: Value = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Config("search response had no message content".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchParams {
    query: String,
}

pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for information about companies, markets and stocks"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to search for" }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params: SearchParams = parse_params(input)?;
        tracing::info!(query = %params.query, "Searching the web");

        let message = match self.provider.search(&params.query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(query = %params.query, error = %e, "Web search failed");
                format!(
                    "Sorry, I couldn't search for information about \"{}\" right now. Please try again later.",
                    params.query
                )
            }
        };

        Ok(ToolOutput::success(json!({ "message": message })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThinkParams {
    thought_process: Vec<String>,
}

/// Records a chain of reasoning steps in the log.
pub struct ThinkTool;

#[async_trait::async_trait]
impl Tool for ThinkTool {
    fn name(&self) -> &'static str {
        "think"
    }

    fn description(&self) -> &'static str {
        "Think through a decision step by step before acting"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "thought_process": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Reasoning steps, in order"
                }
            },
            "required": ["thought_process"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params: ThinkParams = parse_params(input)?;
        for (step, thought) in params.thought_process.iter().enumerate() {
            tracing::info!(step = step + 1, "{}", thought);
        }

        Ok(ToolOutput::success(json!({
            "message": format!(
                "Completed thinking with {} steps of reasoning.",
                params.thought_process.len()
            ),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait::async_trait]
    impl SearchProvider for Canned {
        async fn search(&self, _query: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_think_counts_steps() {
        let output = ThinkTool
            .execute(&ToolInput::new(
                "think",
                json!({ "thought_process": ["cash is $1000", "AAPL looks cheap"] }),
            ))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(
            output.message(),
            Some("Completed thinking with 2 steps of reasoning.")
        );
    }

    #[tokio::test]
    async fn test_search_returns_answer() {
        let tool = WebSearchTool::new(Arc::new(Canned("AAPL reported record revenue.")));
        let output = tool
            .execute(&ToolInput::new("web_search", json!({ "query": "AAPL earnings" })))
            .await
            .unwrap();

        assert_eq!(output.message(), Some("AAPL reported record revenue."));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_apology() {
        let tool = WebSearchTool::new(Arc::new(DisabledSearch));
        let output = tool
            .execute(&ToolInput::new("web_search", json!({ "query": "TSLA news" })))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(
            output.message(),
            Some("Sorry, I couldn't search for information about \"TSLA news\" right now. Please try again later.")
        );
    }

    #[tokio::test]
    async fn test_openai_search_unreachable_is_an_error() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            quote_timeout_secs: 1,
            ..Config::default()
        };
        let search = OpenAiSearch::from_config(&config)
            .unwrap()
            .unwrap()
            .with_url("http://127.0.0.1:9/v1/chat/completions");

        assert!(search.search("AAPL outlook").await.is_err());
    }

    #[test]
    fn test_openai_search_requires_key() {
        let mut config = Config::default();
        config.openai_api_key = None;
        assert!(OpenAiSearch::from_config(&config).unwrap().is_none());

        config.openai_api_key = Some("  ".to_string());
        assert!(OpenAiSearch::from_config(&config).unwrap().is_none());

        config.openai_api_key = Some("sk-test".to_string());
        assert!(OpenAiSearch::from_config(&config).unwrap().is_some());
    }
}
