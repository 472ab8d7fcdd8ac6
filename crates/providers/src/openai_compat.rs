//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and any endpoint exposing
//! `/v1/chat/completions` with function calling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steward_core::error::ProviderError;
use steward_core::message::{Message, MessageToolCall, Role};
use steward_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    /// OpenAI's reasoning models reject `max_tokens`.
    max_tokens_field: &'static str,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let name = name.into();
        let max_tokens_field = if name == "openai" {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };

        Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_tokens_field,
            client,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let tool_calls: Option<Vec<ApiToolCall>> = if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                };
                // An assistant turn that only calls tools carries no content.
                let content = if tool_calls.is_some() && m.content.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                };
                ApiMessage {
                    role: match m.role {
                        Role::User => "user".into(),
                        Role::Assistant => "assistant".into(),
                        Role::System => "system".into(),
                        Role::Tool => "tool".into(),
                    },
                    content,
                    tool_calls,
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body[self.max_tokens_field] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn into_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let message = Message::assistant_with_calls(
            choice.message.content.unwrap_or_default(),
            tool_calls,
        );

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

/// Map a non-success HTTP status to a provider error.
pub(crate) fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::ModelNotFound(body),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(status_error(status, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::into_response(api_response)
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(max_tokens: Option<u32>, temperature: Option<f32>) -> ProviderRequest {
        ProviderRequest {
            model: "gpt-5-nano".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            temperature,
            max_tokens,
            tools: vec![ToolDefinition {
                name: "check_inbox".into(),
                description: "Check the inbox for recent emails".into(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }],
        }
    }

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        assert_eq!(provider.name(), "openai");
        assert!(provider.base_url.contains("api.openai.com"));
        assert_eq!(provider.max_tokens_field, "max_completion_tokens");
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url.contains("localhost:11434"));
        assert_eq!(provider.max_tokens_field, "max_tokens");
    }

    #[test]
    fn body_omits_unset_sampling_fields() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        let body = provider.build_body(&request(None, None));
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_completion_tokens").is_none());
        assert_eq!(body["tools"][0]["function"]["name"], "check_inbox");
        assert_eq!(body["tools"][0]["type"], "function");
    }

    #[test]
    fn body_uses_provider_specific_token_field() {
        let openai = OpenAiCompatProvider::openai("sk-test");
        let body = openai.build_body(&request(Some(256), Some(0.2)));
        assert_eq!(body["max_completion_tokens"], 256);
        assert!(body.get("max_tokens").is_none());

        let ollama = OpenAiCompatProvider::ollama(None);
        let body = ollama.build_body(&request(Some(256), None));
        assert_eq!(body["max_tokens"], 256);
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn tool_only_assistant_message_has_no_content() {
        let msg = Message::assistant_with_calls(
            "",
            vec![MessageToolCall {
                id: "call_1".into(),
                name: "authenticate".into(),
                arguments: r#"{"email":"a","password":"b"}"#.into(),
            }],
        );
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg]);
        assert!(api_msgs[0].content.is_none());
        let tc = api_msgs[0].tool_calls.as_ref().unwrap();
        assert_eq!(tc[0].function.name, "authenticate");
    }

    #[test]
    fn message_conversion_tool_response() {
        let msg = Message::tool_result("call_1", "Authentication failed");
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg]);
        assert_eq!(api_msgs[0].role, "tool");
        assert_eq!(api_msgs[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn parse_tool_call_response() {
        let data = r#"{
            "model": "gpt-5-nano-2025-08-07",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "send_email", "arguments": "{\"to\":\"jane@example.com\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::into_response(parsed).unwrap();
        assert_eq!(response.model, "gpt-5-nano-2025-08-07");
        assert_eq!(response.message.content, "");
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].name, "send_email");
        assert_eq!(response.usage.unwrap().total_tokens, 20);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"model": "m", "choices": []}"#).unwrap();
        assert!(OpenAiCompatProvider::into_response(parsed).is_err());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error(401, String::new()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_error(500, "boom".into()),
            ProviderError::ApiError { status_code: 500, .. }
        ));
    }
}
