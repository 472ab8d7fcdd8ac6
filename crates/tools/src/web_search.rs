//! Web search tool backed by the Tavily search API.
//!
//! The HTTP call sits behind [`SearchBackend`] so the chef agent can be
//! exercised end-to-end without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use steward_config::SearchConfig;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use tracing::debug;

pub const WEB_SEARCH: &str = "web_search";

/// A single hit returned by a search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Something that can answer a search query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<SearchResponse, ToolError>;
}

/// Tavily (`POST {api_url}/search`).
pub struct TavilySearch {
    api_key: String,
    api_url: String,
    max_results: u32,
    search_depth: String,
    include_answer: bool,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn from_config(api_key: impl Into<String>, config: &SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.into(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            search_depth: config.search_depth.clone(),
            include_answer: config.include_answer,
            client,
        }
    }

    fn request_body(&self, query: &str) -> serde_json::Value {
        serde_json::json!({
            "query": query,
            "max_results": self.max_results,
            "search_depth": self.search_depth,
            "include_answer": self.include_answer,
        })
    }

    fn failure(&self, reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: WEB_SEARCH.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ToolError> {
        let url = format!("{}/search", self.api_url);
        debug!(backend = "tavily", %url, "Sending search request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(query))
            .send()
            .await
            .map_err(|e| self.failure(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("search API returned {status}: {body}")));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| self.failure(format!("invalid search response: {e}")))
    }
}

/// `web_search(query)`: runs the query through the configured backend and
/// returns the response JSON.
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let response = self.backend.search(query).await?;
        debug!(
            backend = self.backend.name(),
            hits = response.results.len(),
            "Search completed"
        );

        let data = serde_json::to_value(&response).map_err(|e| ToolError::ExecutionFailed {
            tool_name: WEB_SEARCH.into(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::text(data.to_string()).with_data(data))
    }
}
