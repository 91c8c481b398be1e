//! Runtime configuration.
//!
//! ```yaml
//! guard:
//!   max_input_length: 10000
//!   llm_timeout: 10s
//!   max_retries: 2
//!   retry_min_delay: 200ms
//!   token_budget: 200000
//!   model: claude-sonnet-4-20250514
//!   max_tokens: 400
//!   circuit_breaker:
//!     failure_threshold: 3
//!     recovery_timeout: 30s
//!     success_threshold: 2
//!   cache:
//!     max_entries: 10000
//!     ttl: 1h
//! events:
//!   queue_capacity: 256
//!   sink_timeout: 2s
//! ```
//!
//! Every field is optional. Unknown top-level sections are ignored so the
//! same file can carry the core configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::resilience::CircuitBreakerConfig;

/// Errors that can occur when loading runtime configuration.
#[derive(Error, Debug)]
pub enum RuntimeConfigError {
    #[error("Failed to read runtime config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse runtime config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Runtime config validation failed: {0}")]
    Validation(String),
}

/// Serde adapter for durations written as `10s`, `250ms`, `1h`.
pub(crate) mod human_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

/// Audit cache sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,
    #[serde(with = "human_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Compliance guard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Characters above which a message is rejected outright
    pub max_input_length: usize,

    /// Overall limit for one cognitive audit, retries included
    #[serde(with = "human_duration")]
    pub llm_timeout: Duration,

    /// Retries after the first attempt, transient errors only
    pub max_retries: usize,

    #[serde(with = "human_duration")]
    pub retry_min_delay: Duration,

    pub token_budget: u32,
    pub model: String,
    pub max_tokens: u32,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_input_length: crate::guard::MAX_INPUT_LENGTH,
            llm_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_min_delay: Duration::from_millis(200),
            token_budget: 200_000,
            model: crate::providers::DEFAULT_MODEL.to_string(),
            max_tokens: 400,
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Objection event dispatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub queue_capacity: usize,
    #[serde(with = "human_duration")]
    pub sink_timeout: Duration,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            sink_timeout: Duration::from_secs(2),
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub guard: GuardConfig,
    pub events: EventsConfig,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuntimeConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        let invalid = |msg: &str| Err(RuntimeConfigError::Validation(msg.to_string()));

        if self.guard.max_input_length == 0 {
            return invalid("guard.max_input_length must be at least 1");
        }
        if self.guard.llm_timeout.is_zero() {
            return invalid("guard.llm_timeout must be greater than zero");
        }
        if self.guard.circuit_breaker.failure_threshold == 0 {
            return invalid("guard.circuit_breaker.failure_threshold must be at least 1");
        }
        if self.guard.circuit_breaker.success_threshold == 0 {
            return invalid("guard.circuit_breaker.success_threshold must be at least 1");
        }
        if self.guard.model.trim().is_empty() {
            return invalid("guard.model must not be blank");
        }
        if self.events.queue_capacity == 0 {
            return invalid("events.queue_capacity must be at least 1");
        }

        Ok(())
    }
}
