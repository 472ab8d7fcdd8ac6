//! Configuration loading, validation, and management for Steward.
//!
//! Loads configuration from `~/.steward/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use steward_core::approval::ApprovalPolicy;

/// The root configuration structure.
///
/// Maps directly to `~/.steward/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature. Unset means the provider default is used,
    /// which is required by models that reject explicit temperatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Upper bound on model calls within one turn
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Web search backend used by the chef agent
    #[serde(default)]
    pub search: SearchConfig,

    /// Credentials the email agent authenticates against
    #[serde(default)]
    pub email: EmailConfig,

    /// Capability name → whether calls pause for human approval.
    /// Entries are layered over the built-in table.
    #[serde(default = "default_approval")]
    pub approval: BTreeMap<String, bool>,

    /// Where sessions are checkpointed between turns
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-5-nano".into()
}
fn default_max_tool_iterations() -> u32 {
    25
}
/// Capabilities that always pause for approval.
const ALWAYS_APPROVED: &[&str] = &["send_email"];

fn default_approval() -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("authenticate".to_string(), false),
        ("check_inbox".to_string(), false),
        ("send_email".to_string(), true),
    ])
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("providers", &self.providers)
            .field("search", &self.search)
            .field("email", &self.email)
            .field("approval", &self.approval)
            .field("checkpoint", &self.checkpoint)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Tavily search settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_url")]
    pub api_url: String,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// "basic" or "advanced"
    #[serde(default = "default_search_depth")]
    pub search_depth: String,

    #[serde(default)]
    pub include_answer: bool,
}

fn default_search_url() -> String {
    "https://api.tavily.com".into()
}
fn default_max_results() -> u32 {
    5
}
fn default_search_depth() -> String {
    "basic".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_search_url(),
            max_results: default_max_results(),
            search_depth: default_search_depth(),
            include_answer: false,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("max_results", &self.max_results)
            .field("search_depth", &self.search_depth)
            .field("include_answer", &self.include_answer)
            .finish()
    }
}

/// The single (address, password) pair the email agent accepts.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_address")]
    pub address: String,

    #[serde(default = "default_email_password")]
    pub password: String,
}

fn default_email_address() -> String {
    "julie@example.com".into()
}
fn default_email_password() -> String {
    "password123".into()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            address: default_email_address(),
            password: default_email_password(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("address", &self.address)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// "memory" or "file"
    #[serde(default = "default_checkpoint_backend")]
    pub backend: String,

    /// Directory for the file backend (default: `~/.steward/threads`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_checkpoint_backend() -> String {
    "memory".into()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: default_checkpoint_backend(),
            dir: None,
        }
    }
}

impl CheckpointConfig {
    /// Resolved directory for file checkpoints.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| AppConfig::config_dir().join("threads"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.steward/config.toml).
    ///
    /// Environment variables override the file:
    /// - `STEWARD_API_KEY`, then `OPENAI_API_KEY` (model key, if unset in file)
    /// - `TAVILY_API_KEY` (search key, if unset in file)
    /// - `STEWARD_PROVIDER`, `STEWARD_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path without validating it.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("STEWARD_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if self.search.api_key.is_none() {
            self.search.api_key = lookup("TAVILY_API_KEY");
        }
        if let Some(provider) = lookup("STEWARD_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("STEWARD_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".steward")
    }

    /// The built-in approval table with `[approval]` entries layered on top.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::from(default_approval()).merged(&self.approval)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in ALWAYS_APPROVED {
            if self.approval.get(*name) == Some(&false) {
                return Err(ConfigError::ValidationError(format!(
                    "approval.{name} cannot be disabled"
                )));
            }
        }

        if let Some(t) = self.default_temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "default_temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_iterations must be at least 1".into(),
            ));
        }

        if !(1..=20).contains(&self.search.max_results) {
            return Err(ConfigError::ValidationError(
                "search.max_results must be between 1 and 20".into(),
            ));
        }

        if !matches!(self.search.search_depth.as_str(), "basic" | "advanced") {
            return Err(ConfigError::ValidationError(format!(
                "search.search_depth must be \"basic\" or \"advanced\", got \"{}\"",
                self.search.search_depth
            )));
        }

        if self.email.address.is_empty() || self.email.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "email.address and email.password must not be empty".into(),
            ));
        }

        if !matches!(self.checkpoint.backend.as_str(), "memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "unknown checkpoint backend \"{}\" (expected \"memory\" or \"file\")",
                self.checkpoint.backend
            )));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: None,
            default_max_tokens: None,
            max_tool_iterations: default_max_tool_iterations(),
            providers: HashMap::new(),
            search: SearchConfig::default(),
            email: EmailConfig::default(),
            approval: default_approval(),
            checkpoint: CheckpointConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for steward_core::Error {
    fn from(e: ConfigError) -> Self {
        steward_core::Error::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-5-nano");
        assert!(config.default_temperature.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_approval_table() {
        let config = AppConfig::default();
        assert_eq!(config.approval.get("authenticate"), Some(&false));
        assert_eq!(config.approval.get("check_inbox"), Some(&false));
        assert_eq!(config.approval.get("send_email"), Some(&true));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.email.address, config.email.address);
        assert_eq!(parsed.approval, config.approval);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: Some(5.0),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_checkpoint_backend_rejected() {
        let mut config = AppConfig::default();
        config.checkpoint.backend = "redis".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn empty_credentials_rejected() {
        let mut config = AppConfig::default();
        config.email.password = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn search_bounds_checked() {
        let mut config = AppConfig::default();
        config.search.max_results = 0;
        assert!(config.validate().is_err());
        config.search.max_results = 5;
        config.search.search_depth = "deep".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o-mini"

[email]
address = "sam@example.com"

[approval]
check_inbox = true
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.email.address, "sam@example.com");
        assert_eq!(config.email.password, "password123");

        let policy = config.approval_policy();
        assert!(policy.requires_approval("check_inbox"));
        assert!(policy.requires_approval("send_email"));
        assert!(!policy.requires_approval("authenticate"));
    }

    #[test]
    fn send_email_approval_cannot_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[approval]\nsend_email = false\n").unwrap();

        let mut config = AppConfig::load_from(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("send_email"));

        config.approval.insert("send_email".into(), true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_leaves_validation_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_tool_iterations = 0\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unparseable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_fill_missing_keys() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "TAVILY_API_KEY" => Some("tvly-test".into()),
            "STEWARD_MODEL" => Some("gpt-4o".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.search.api_key.as_deref(), Some("tvly-test"));
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn env_does_not_replace_file_key() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|_| Some("sk-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("password123"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-5-nano"));
        assert!(toml_str.contains("send_email"));
    }
}
