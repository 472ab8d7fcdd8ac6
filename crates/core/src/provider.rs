//! Provider trait — the abstraction over hosted LLM backends.
//!
//! A Provider sends a conversation plus the tool definitions exposed for this
//! turn and returns the model's next message.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-5-nano")
    pub model: String,

    /// The conversation messages, system prompt first
    pub messages: Vec<Message>,

    /// Sampling temperature; omitted for models that only accept the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may call on this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message (may carry tool calls)
    pub message: Message,

    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend serves it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// List available models for this provider.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_temperature() {
        let req = ProviderRequest {
            model: "gpt-5-nano".into(),
            messages: vec![],
            temperature: None,
            max_tokens: None,
            tools: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "send_email".into(),
            description: "Send an response email".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "to": { "type": "string" }
                },
                "required": ["to"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("send_email"));
        assert!(json.contains("required"));
    }
}
