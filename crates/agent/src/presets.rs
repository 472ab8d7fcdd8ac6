//! Ready-made agents: the personal chef and the authentication-gated email
//! assistant.

use crate::gate::{AccessGate, CHEF_PROMPT, StaticPolicy, TurnPlan};
use crate::loop_runner::AgentLoop;
use std::sync::Arc;
use steward_config::AppConfig;
use steward_core::event::EventBus;
use steward_core::provider::Provider;
use steward_security::{AuditLogger, Authenticator, Credential};
use steward_tools::{SearchBackend, WEB_SEARCH, chef_registry, email_registry};

fn configured(agent: AgentLoop, config: &AppConfig) -> AgentLoop {
    agent
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_iterations(config.max_tool_iterations)
        .with_approvals(config.approval_policy())
}

/// The chef: a fixed prompt and `web_search`, whatever the session state.
pub fn chef_agent(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    search: Arc<dyn SearchBackend>,
    event_bus: Arc<EventBus>,
) -> AgentLoop {
    let policy = StaticPolicy::new(TurnPlan::new([WEB_SEARCH], CHEF_PROMPT));
    configured(
        AgentLoop::new(
            provider,
            config.default_model.clone(),
            Arc::new(chef_registry(search)),
            Arc::new(policy),
            event_bus,
        ),
        config,
    )
}

/// The email assistant: capabilities gated on authentication against the
/// configured credential, with `send_email` held for approval by default.
pub fn email_agent(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    event_bus: Arc<EventBus>,
    audit: Arc<AuditLogger>,
) -> AgentLoop {
    let credential = Credential::new(config.email.address.clone(), config.email.password.clone());
    let authenticator = Arc::new(Authenticator::new(&credential).with_audit(audit.clone()));
    configured(
        AgentLoop::new(
            provider,
            config.default_model.clone(),
            Arc::new(email_registry(authenticator)),
            Arc::new(AccessGate),
            event_bus,
        ),
        config,
    )
    .with_audit(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, text_response, tool_call, tool_response};
    use async_trait::async_trait;
    use steward_core::error::ToolError;
    use steward_core::session::Session;
    use steward_tools::SearchResponse;

    struct NoSearch;

    #[async_trait]
    impl SearchBackend for NoSearch {
        fn name(&self) -> &str {
            "none"
        }

        async fn search(&self, query: &str) -> Result<SearchResponse, ToolError> {
            Ok(SearchResponse {
                query: query.into(),
                answer: None,
                results: vec![],
            })
        }
    }

    #[tokio::test]
    async fn chef_uses_fixed_prompt_and_search() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("Try a frittata.")]));
        let config = AppConfig::default();
        let agent = chef_agent(provider.clone(), &config, Arc::new(NoSearch), Arc::new(EventBus::default()));

        let mut session = Session::new();
        agent.send(&mut session, "eggs, spinach").await.unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-5-nano");
        assert!(request.temperature.is_none());
        assert_eq!(request.messages[0].content, CHEF_PROMPT);
        assert_eq!(provider.offered_tools(0), vec!["web_search"]);
    }

    #[tokio::test]
    async fn approval_overrides_keep_send_gated() {
        let provider = Arc::new(ScriptedProvider::new(vec![tool_response(vec![tool_call(
            "c1",
            "send_email",
            serde_json::json!({"to": "a@b.co", "subject": "Hi", "body": "Hello"}),
        )])]));
        let mut config = AppConfig::default();
        config.approval = [("check_inbox".to_string(), false)].into();
        let agent = email_agent(
            provider.clone(),
            &config,
            Arc::new(EventBus::default()),
            Arc::new(AuditLogger::new()),
        );
        let mut session = Session::new();
        session.state.authenticated = true;

        let outcome = agent.send(&mut session, "email a@b.co").await.unwrap();
        assert_eq!(outcome.pending().unwrap().call.name, "send_email");
        assert!(
            !session
                .conversation
                .messages
                .iter()
                .any(|m| m.content.starts_with("Email sent"))
        );
    }

    #[test]
    fn email_agent_holds_send_for_approval() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let agent = email_agent(
            provider,
            &AppConfig::default(),
            Arc::new(EventBus::default()),
            Arc::new(AuditLogger::new()),
        );
        let mut session = Session::new();
        session.state.authenticated = true;

        let send = agent
            .capabilities(&session)
            .into_iter()
            .find(|d| d.name() == "send_email")
            .unwrap();
        assert!(send.requires_approval);
    }
}
