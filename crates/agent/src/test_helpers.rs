//! Shared test helpers for agent tests.

use std::sync::Mutex;
use steward_core::error::ProviderError;
use steward_core::message::{Message, MessageToolCall};
use steward_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted responses and keeps
/// every request it received.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Tool names offered on the nth request.
    pub fn offered_tools(&self, n: usize) -> Vec<String> {
        self.requests.lock().unwrap()[n]
            .tools
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        if n >= responses.len() {
            panic!(
                "ScriptedProvider: no more responses (call #{n}, have {})",
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[n].clone())
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn tool_response(calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls("", calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
