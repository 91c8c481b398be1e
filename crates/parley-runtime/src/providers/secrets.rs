//! Provider API keys that never print.
//!
//! ```ignore
//! let key = ApiCredential::from_env("ANTHROPIC_API_KEY")?;
//! request.header("x-api-key", key.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ProviderError;

/// Where a key came from. Safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Read from the named environment variable
    Env(&'static str),
    /// Passed in by the caller
    Inline,
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Env(var) => write!(f, "${}", var),
            CredentialOrigin::Inline => f.write_str("inline"),
        }
    }
}

/// An API key held in a [`SecretString`]; zeroed on drop.
pub struct ApiCredential {
    key: SecretString,
    origin: CredentialOrigin,
}

impl ApiCredential {
    pub fn inline(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            origin: CredentialOrigin::Inline,
        }
    }

    /// Read `var`. Unset and blank are both `NotConfigured`.
    pub fn from_env(var: &'static str) -> Result<Self, ProviderError> {
        let key = std::env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(format!("{} is not set", var)))?;

        Ok(Self {
            key: SecretString::from(key),
            origin: CredentialOrigin::Env(var),
        })
    }

    /// The raw key, for the request header only.
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.key.expose_secret().is_empty()
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential({}, [REDACTED])", self.origin)
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED] via {}", self.origin)
    }
}
