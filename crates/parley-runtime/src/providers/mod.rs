//! LLM backends for the guard's cognitive audit.
//!
//! The guard only ever holds an `Arc<dyn LlmProvider>`. Tests plug in
//! scripted providers; offline deployments use [`NullProvider`].
//!
//! ## Security
//!
//! Providers keep keys in [`ApiCredential`], which never prints its value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use secrets::{ApiCredential, CredentialOrigin};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicProvider, ANTHROPIC_API_KEY_ENV};

/// Why a provider call failed.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("credentials rejected")]
    Unauthorized,

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Worth retrying: network trouble, throttling, or a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Malformed(_)
            | ProviderError::Unauthorized
            | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// Model used for the cognitive audit unless configured otherwise.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Per-call generation settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    /// 0.0 for a repeatable verdict
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 400,
            temperature: 0.0,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Whether a call could succeed at all (credentials present).
    async fn health_check(&self) -> bool;

    fn name(&self) -> &str;

    /// Budget estimate before a call: about four characters per token.
    fn estimate_tokens(&self, text: &str) -> u32 {
        u32::try_from(text.chars().count() / 4).unwrap_or(u32::MAX)
    }
}

/// A provider that is never configured.
///
/// Every completion fails with [`ProviderError::NotConfigured`], so the
/// guard's second tier always degrades to human review.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

#[async_trait]
impl LlmProvider for NullProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "no LLM provider configured for cognitive audit".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let msg = ChatMessage::system("rules");
        assert_eq!(msg.role, Role::System);
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "system");
        assert_eq!(ChatMessage::user("hi").role.to_string(), "user");
    }

    #[test]
    fn test_default_model_is_dated_release() {
        assert_eq!(DEFAULT_MODEL, "claude-sonnet-4-20250514");
        assert_eq!(CompletionConfig::default().model, DEFAULT_MODEL);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(ProviderError::Status { status: 529, message: "overloaded".into() }.is_transient());
        assert!(!ProviderError::Status { status: 400, message: "bad".into() }.is_transient());
        assert!(!ProviderError::Unauthorized.is_transient());
        assert!(!ProviderError::Malformed("eof".into()).is_transient());
        assert!(!ProviderError::NotConfigured("x".into()).is_transient());
    }

    #[test]
    fn test_estimate_counts_characters() {
        assert_eq!(NullProvider.estimate_tokens("abcdefgh"), 2);
        assert_eq!(NullProvider.estimate_tokens("ééééé"), 1);
    }

    #[tokio::test]
    async fn test_null_provider_is_unconfigured() {
        let provider = NullProvider;
        let result = provider
            .complete(vec![ChatMessage::user("hello")], &CompletionConfig::default())
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
        assert!(!provider.health_check().await);
    }
}
