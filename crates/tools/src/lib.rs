//! Built-in capabilities for Steward agents.
//!
//! - `web_search` for the chef agent (Tavily behind a [`SearchBackend`])
//! - `authenticate`, `check_inbox` and `send_email` for the email agent

pub mod email;
pub mod web_search;

use std::sync::Arc;
use steward_core::tool::ToolRegistry;
use steward_security::Authenticator;

pub use email::{
    AUTHENTICATE, AuthenticateTool, CHECK_INBOX, CheckInboxTool, INBOX, SEND_EMAIL, SendEmailTool,
};
pub use web_search::{
    SearchBackend, SearchHit, SearchResponse, TavilySearch, WEB_SEARCH, WebSearchTool,
};

/// Registry for the chef agent: just `web_search`.
pub fn chef_registry(backend: Arc<dyn SearchBackend>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WebSearchTool::new(backend)));
    registry
}

/// Registry for the email agent.
///
/// All three capabilities are registered; which of them the model sees on a
/// given turn is decided by the agent's access gate.
pub fn email_registry(authenticator: Arc<Authenticator>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(AuthenticateTool::new(authenticator)));
    registry.register(Box::new(CheckInboxTool));
    registry.register(Box::new(SendEmailTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_security::Credential;

    #[test]
    fn email_registry_holds_all_capabilities() {
        let authenticator = Arc::new(Authenticator::new(&Credential::new("a@b.c", "pw")));
        let registry = email_registry(authenticator);
        assert_eq!(
            registry.names(),
            vec!["authenticate", "check_inbox", "send_email"]
        );
    }
}
