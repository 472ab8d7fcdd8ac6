//! Email capabilities: `authenticate`, `check_inbox` and `send_email`.
//!
//! Inbox and transport are fixed stand-ins; the inbox always holds one
//! message and sending only echoes what would have been sent.

use async_trait::async_trait;
use std::sync::Arc;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use steward_security::Authenticator;
use tracing::info;

pub const AUTHENTICATE: &str = "authenticate";
pub const CHECK_INBOX: &str = "check_inbox";
pub const SEND_EMAIL: &str = "send_email";

pub const INBOX: &str = "\n    Hi Julie, \n    I'm going to be in town next week and was wondering if we could grab a coffee?\n    - best, Jane (jane@example.com)\n    ";

fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// `authenticate(email, password)`.
///
/// A failed match is still a successful call: the verdict text goes back to
/// the model and the returned session update carries `authenticated: false`.
pub struct AuthenticateTool {
    authenticator: Arc<Authenticator>,
}

impl AuthenticateTool {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

#[async_trait]
impl Tool for AuthenticateTool {
    fn name(&self) -> &str {
        AUTHENTICATE
    }

    fn description(&self) -> &str {
        "Authenticate the user with the given email and password"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "email": { "type": "string", "description": "The user's email address" },
                "password": { "type": "string", "description": "The user's password" }
            },
            "required": ["email", "password"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let email = required_str(&arguments, "email")?;
        let password = required_str(&arguments, "password")?;

        let verdict = self.authenticator.authenticate(email, password);
        info!(identity = %email, outcome = ?verdict.outcome, "Authentication attempt");

        Ok(ToolResult::text(verdict.message)
            .with_data(serde_json::json!({ "outcome": verdict.outcome }))
            .with_session_update(verdict.update))
    }
}

pub struct CheckInboxTool;

#[async_trait]
impl Tool for CheckInboxTool {
    fn name(&self) -> &str {
        CHECK_INBOX
    }

    fn description(&self) -> &str {
        "Check the inbox for recent emails"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::text(INBOX))
    }
}

pub struct SendEmailTool;

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        SEND_EMAIL
    }

    fn description(&self) -> &str {
        "Send an response email"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "to": { "type": "string", "description": "Recipient address" },
                "subject": { "type": "string" },
                "body": { "type": "string" }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let to = required_str(&arguments, "to")?;
        let subject = required_str(&arguments, "subject")?;
        let body = required_str(&arguments, "body")?;

        info!(%to, %subject, "Sending email");
        Ok(ToolResult::text(format!(
            "Email sent to {to} with subject {subject} and body {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use steward_security::Credential;

    fn authenticate_tool() -> AuthenticateTool {
        AuthenticateTool::new(Arc::new(Authenticator::new(&Credential::new(
            "julie@example.com",
            "password123",
        ))))
    }

    #[tokio::test]
    async fn authenticate_success_carries_update() {
        let result = authenticate_tool()
            .execute(json!({"email": "julie@example.com", "password": "password123"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Successfully authenticated");
        assert!(result.session_update.unwrap().authenticated);
        assert_eq!(result.data.unwrap()["outcome"], "authenticated");
    }

    #[tokio::test]
    async fn authenticate_failure_is_not_an_error() {
        let result = authenticate_tool()
            .execute(json!({"email": "wrong@x.com", "password": "bad"}))
            .await
            .unwrap();
        assert_eq!(result.output, "Authentication failed");
        assert!(!result.session_update.unwrap().authenticated);
    }

    #[tokio::test]
    async fn authenticate_requires_both_fields() {
        let err = authenticate_tool()
            .execute(json!({"email": "julie@example.com"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn inbox_is_stable() {
        let first = CheckInboxTool.execute(json!({})).await.unwrap();
        let second = CheckInboxTool.execute(json!({})).await.unwrap();
        assert_eq!(first.output, INBOX);
        assert_eq!(first.output, second.output);
        assert!(first.output.starts_with("\n    Hi Julie, \n"));
        assert!(first.output.ends_with("(jane@example.com)\n    "));
    }

    #[tokio::test]
    async fn send_email_echoes_inputs() {
        let result = SendEmailTool
            .execute(json!({"to": "jane@example.com", "subject": "Coffee", "body": "Sure!"}))
            .await
            .unwrap();
        assert_eq!(
            result.output,
            "Email sent to jane@example.com with subject Coffee and body Sure!"
        );
        assert!(result.session_update.is_none());
    }

    #[tokio::test]
    async fn send_email_rejects_missing_recipient() {
        let err = SendEmailTool
            .execute(json!({"subject": "Coffee", "body": "Sure!"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'to'"));
    }

    #[test]
    fn descriptions() {
        assert_eq!(CheckInboxTool.description(), "Check the inbox for recent emails");
        assert_eq!(SendEmailTool.description(), "Send an response email");
        assert_eq!(
            authenticate_tool().description(),
            "Authenticate the user with the given email and password"
        );
    }
}
